use crate::args::LinkArgs;
use crate::commands::Out;
use crate::model::DateRange;
use crate::{Config, Result};
use chrono::Local;

/// Handles the `expendash link` command - prints the shareable link that
/// reproduces a date range.
pub async fn link(config: &Config, args: &LinkArgs) -> Result<Out<String>> {
    let today = Local::now().date_naive();
    let range = DateRange::resolve(args.from(), args.to(), None, today);
    let mut url = config.share_url();
    range.apply_to_url(&mut url);
    Ok(Out::new(url.to_string(), url.to_string()))
}
