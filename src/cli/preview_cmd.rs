use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};

use catstats::core::client::HttpStatsSource;
use catstats::core::config::OverlayConfig;
use catstats::core::dom::{Document, SharedDocument};
use catstats::core::models::range::Range;
use catstats::overlay::Overlay;

use crate::cli::output::{self, OutputFormat, OutputOptions};

pub struct PreviewArgs {
    pub config: Option<PathBuf>,
    pub endpoint: Option<String>,
    pub range: Option<String>,
    pub open: bool,
}

/// A stand-in for the chat page: one app root holding some content.
fn sample_host(host_root_id: &str) -> SharedDocument {
    let mut doc = Document::new();
    let body = doc.body();
    let root = doc.create_element("div");
    doc.set_id(root, host_root_id);
    let thread = doc.create_with("div", &["chat-thread"], "");
    let message = doc.create_with("p", &["chat-message"], "Arch酱: ...来了。有什么事说。");
    doc.append_child(thread, message);
    doc.append_child(root, thread);
    doc.append_child(body, root);
    doc.into_shared()
}

/// Mount the overlay into a sample page, run the requested triggers against
/// the real endpoint, and print what the page ends up containing.
pub async fn run(args: PreviewArgs, opts: &OutputOptions) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => OverlayConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => OverlayConfig::default(),
    };
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }

    let issues = config.validate();
    if !issues.is_empty() {
        anyhow::bail!("Invalid overlay config:\n  - {}", issues.join("\n  - "));
    }

    let range = match args.range.as_deref() {
        Some(id) => Some(
            Range::from_id(id)
                .with_context(|| format!("Unknown range: '{}' (expected day|week|month)", id))?,
        ),
        None => None,
    };

    let source = HttpStatsSource::new(&config.endpoint).context("Failed to build HTTP client")?;
    let host = sample_host(&config.ids.host_root);
    let mut overlay = Overlay::new(host, config, Rc::new(source));
    overlay.install();

    let mut pending = Vec::new();
    if let Some(range) = range {
        pending.push(overlay.select(range));
    }
    // Without any trigger there is nothing to show, so open by default.
    if args.open || range.is_none() {
        pending.extend(overlay.open());
    }
    for task in pending {
        task.await.context("Stats task failed")?;
    }

    let state = overlay.state();
    if opts.verbose {
        eprintln!(
            "mounted={} open={} range={} requests={}",
            state.mounted,
            state.open,
            overlay.active_range().id(),
            overlay.requests_issued()
        );
    }

    let doc = overlay.document().borrow();
    match opts.format {
        OutputFormat::Html => print!("{}", doc.to_html(doc.root())),
        OutputFormat::Text => {
            let slot = overlay
                .content_slot()
                .context("Overlay panel is missing its content slot")?;
            println!("{}", output::render_slot_text(&doc, slot));
        }
    }
    Ok(())
}
