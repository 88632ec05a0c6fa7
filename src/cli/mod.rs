mod print;
mod root;

pub use print::PrintCommand;
pub use root::Cli;

use anyhow::{Context, Result};
use duallist::config::Config;
use duallist::sources::{HttpLookupFetcher, InMemoryMetadata};
use duallist::DualListWidget;
use std::sync::Arc;

/// Build the widget and its collaborators from configuration
pub async fn build_widget(config: &Config) -> Result<DualListWidget> {
    let mut widget =
        DualListWidget::new(&config.widget).with_search_policy(config.search_policy());

    if let Some(path) = &config.metadata_catalog {
        let metadata = InMemoryMetadata::from_file(path)
            .await
            .with_context(|| format!("Failed to load metadata catalog {}", path.display()))?;
        widget = widget.with_metadata(Arc::new(metadata));
    }

    if let Some(lookup) = &config.lookup {
        let service = HttpLookupFetcher::with_timeout(lookup.base_url.clone(), lookup.timeout())?;
        widget = widget.with_lookup_service(Arc::new(service));
    }

    Ok(widget)
}
