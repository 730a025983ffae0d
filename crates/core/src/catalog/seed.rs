use crate::domain::product::CatalogEntry;

/// Catalog shipped with the binary, used when no `catalog.path` is configured.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("30", "Durable Roll Label")
            .with_analytics_name("Sticker")
            .with_category("Roll Labels")
            .with_material("BOPP")
            .with_finish("Matte")
            .with_format("Roll"),
        CatalogEntry::new("11", "White Vinyl Removable Glossy Kiss-Cut Sticker")
            .with_analytics_name("Removable Vinyl Sticker Hand-Outs")
            .with_category("Kiss-Cut Stickers")
            .with_material("Vinyl")
            .with_finish("Glossy")
            .with_format("Sheet"),
        CatalogEntry::new("55", "Laminated Clear Vinyl Removable Sticker")
            .with_analytics_name("Clear Die-Cut Stickers")
            .with_category("Die-Cut Stickers")
            .with_material("Clear Vinyl")
            .with_finish("Laminated")
            .with_format("Single"),
        CatalogEntry::new("12", "White Vinyl Permanent Matte Die-Cut Sticker")
            .with_analytics_name("Outdoor Die-Cut Stickers")
            .with_category("Die-Cut Stickers")
            .with_material("Vinyl")
            .with_finish("Matte")
            .with_format("Single"),
        CatalogEntry::new("14", "Holographic Vinyl Die-Cut Sticker")
            .with_analytics_name("Holographic Stickers")
            .with_category("Die-Cut Stickers")
            .with_material("Holographic Vinyl")
            .with_finish("Holographic")
            .with_format("Single"),
        CatalogEntry::new("21", "Paper Sticker Sheet")
            .with_analytics_name("Sticker Sheets")
            .with_category("Sticker Sheets")
            .with_material("Paper")
            .with_finish("Uncoated")
            .with_format("Sheet"),
        CatalogEntry::new("33", "Clear Roll Label")
            .with_analytics_name("Transparent Product Labels")
            .with_category("Roll Labels")
            .with_material("Clear BOPP")
            .with_finish("Glossy")
            .with_format("Roll"),
        CatalogEntry::new("40", "Bumper Sticker")
            .with_analytics_name("Car Bumper Stickers")
            .with_category("Bumper Stickers")
            .with_material("Outdoor Vinyl")
            .with_finish("UV Laminated")
            .with_format("Single"),
        CatalogEntry::new("47", "Static Cling Window Decal")
            .with_analytics_name("Window Clings")
            .with_category("Decals")
            .with_material("Static Cling Vinyl")
            .with_finish("Clear")
            .with_format("Single"),
        CatalogEntry::new("62", "Magnet Sheet")
            .with_analytics_name("Custom Magnets")
            .with_category("Magnets")
            .with_material("Flexible Magnet")
            .with_finish("Glossy")
            .with_format("Single"),
    ]
}
