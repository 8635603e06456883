use linkcard::share::profile_url;
use linkcard::Slug;
use qrcode::render::unicode;
use qrcode::QrCode;

use super::Context;
use crate::AppError;

#[derive(Clone, Debug, clap::Args)]
#[clap(name = "qr", about = "Show a QR code that opens a card")]
pub struct Qr {
    #[clap(help = "Whose card; defaults to your own")]
    slug: Option<String>,
    #[clap(
        long,
        action,
        help = "Print the image rendered by the server as a data URL"
    )]
    data_url: bool,
}

impl Qr {
    pub async fn run(&self, ctx: &Context) -> Result<(), AppError> {
        let slug = match &self.slug {
            Some(raw) => Slug::parse(raw)?,
            None => ctx.signed_in_user()?.slug.ok_or(AppError::NoSlug)?,
        };

        if self.data_url {
            let qr = match (&self.slug, ctx.session.token()) {
                (None, Some(token)) => ctx.client.qr_code(&token).await?,
                _ => ctx.client.public_qr_code(&slug).await?,
            };
            println!("{}", qr.data_url);
            return Ok(());
        }

        let url = profile_url(&ctx.config.public_base_url, &slug)?;
        println!("{}\n", render(url.as_str())?);
        println!("{}", url);
        Ok(())
    }
}

fn render(data: &str) -> Result<String, AppError> {
    let code = QrCode::new(data.as_bytes())
        .map_err(|e| AppError::QrCode(e.to_string()))?;
    Ok(code
        .render::<unicode::Dense1x2>()
        .dark_color(unicode::Dense1x2::Light)
        .light_color(unicode::Dense1x2::Dark)
        .build())
}
