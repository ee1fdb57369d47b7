//! Request classification preview.

use contabil_cache::config::ConfigFile;
use contabil_cache::worker::{Method, Request, RequestClassifier};

use crate::error::CliError;

/// Print kind, strategy and bucket for each URL.
pub fn run(urls: &[String], navigate: bool, method: &str) -> Result<(), CliError> {
    let method: Method = method
        .parse()
        .map_err(|e: contabil_cache::worker::UnknownMethod| CliError::Config(e.to_string()))?;
    let config = ConfigFile::load()?.worker_config();
    let classifier = RequestClassifier::new(&config)?;

    let width = urls.iter().map(|u| u.len()).max().unwrap_or(0);

    for url in urls {
        let request = Request {
            method,
            url: url.clone(),
            navigate,
        };

        if method != Method::Get || request.is_extension() {
            println!("{:<width$}  passthrough", url, width = width);
            continue;
        }

        let kind = classifier.classify(&request);
        let (strategy, bucket) = kind.route();
        println!(
            "{:<width$}  {:<12}  {:<28}  {}",
            url,
            kind.to_string(),
            strategy.to_string(),
            config.bucket_name(bucket),
            width = width
        );
    }

    Ok(())
}
