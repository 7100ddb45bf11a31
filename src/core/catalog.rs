/// One of the three cats tracked by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub display_name: &'static str,
    pub theme_badge: &'static str,
}

/// Fixed roster in display order. Cards always follow this order, never the
/// iteration order of a statistics payload.
pub static CATALOG: [CatalogEntry; 3] = [
    CatalogEntry {
        id: "arch",
        display_name: "Arch酱",
        theme_badge: "首席架构师",
    },
    CatalogEntry {
        id: "stack",
        display_name: "Stack喵",
        theme_badge: "全栈工程师",
    },
    CatalogEntry {
        id: "pixel",
        display_name: "Pixel咪",
        theme_badge: "UI/UX 设计师",
    },
];

impl CatalogEntry {
    pub fn from_id(id: &str) -> Option<&'static CatalogEntry> {
        CATALOG.iter().find(|e| e.id == id)
    }

    /// Avatar image under `base`, e.g. `/public/avatars/arch.png`.
    pub fn avatar_path(&self, base: &str) -> String {
        format!("{}/{}.png", base.trim_end_matches('/'), self.id)
    }
}
