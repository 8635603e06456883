use url::Url;

use crate::slug::Slug;
use crate::Result;

/// Public address of the card for `slug`, under the web app's base URL.
pub fn profile_url(public_base: &Url, slug: &Slug) -> Result<Url> {
    let mut base = public_base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(slug.as_str())?)
}
