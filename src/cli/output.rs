use catstats::core::dom::{Document, NodeId};
use catstats::overlay::renderer::CARD_CLASS;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Html,
    Text,
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub verbose: bool,
}

/// Plain-text rendering of the content slot, one block per card.
///
/// ```text
///  Arch酱 [首席架构师]
///   Calls 5 | Input 1,000 | Output 0 | Cache read 0 | Cost $1.2346
/// ```
pub fn render_slot_text(doc: &Document, slot: NodeId) -> String {
    let mut lines = Vec::new();
    for &child in doc.children(slot) {
        if doc.has_class(child, CARD_CLASS) {
            let name = doc.find_by_class(child, "catstats-name");
            let badge = doc.find_by_class(child, "catstats-badge");
            lines.push(format!(
                " {} [{}]",
                name.first().map(|&n| doc.text(n)).unwrap_or_default(),
                badge.first().map(|&n| doc.text(n)).unwrap_or_default()
            ));
            let fields: Vec<String> = doc
                .find_by_class(child, "catstats-row")
                .into_iter()
                .map(|row| doc.text_content(row))
                .collect();
            lines.push(format!("  {}", fields.join(" | ")));
        } else {
            lines.push(format!(" {}", doc.text_content(child)));
        }
    }
    lines.join("\n")
}
