mod diff;
mod editor;
mod media;
mod model;

pub use diff::ProfileUpdate;
pub use editor::{ProfileEditor, SaveOutcome};
pub use media::{
    MediaFile, MediaSlot, PendingUpload, PreviewHandle, PreviewRegistry,
    ALLOWED_MEDIA_TYPES, MAX_MEDIA_BYTES,
};
pub use model::{Contact, ContactField, Profile, ProfileField};
