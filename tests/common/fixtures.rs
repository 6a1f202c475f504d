use screen_fusion::component::component_model::{Bounds, Component, RawComponentSet};

pub const SCREEN_W: u32 = 1080;
pub const SCREEN_H: u32 = 1920;

pub fn comp(index: usize, class: &str, text: &str, x: i32, y: i32, w: i32, h: i32) -> Component {
    Component::new(index, class, Bounds::new(x, y, w, h), text)
}

pub fn raw_set(components: Vec<Component>) -> RawComponentSet {
    RawComponentSet::new(SCREEN_W, SCREEN_H, components)
}

/// Price label split in two by OCR, an icon, and a buy button.
pub fn price_scenario() -> RawComponentSet {
    raw_set(vec![
        comp(0, "text", "$", 100, 500, 20, 30),
        comp(1, "text", "199", 125, 500, 60, 30),
        comp(2, "icon", "", 40, 80, 48, 48),
        comp(3, "text", "Buy", 800, 1700, 200, 80).clickable(true),
    ])
}

/// `n` stacked list rows whose OCR text carries a distinct order number.
pub fn order_rows(n: usize) -> RawComponentSet {
    raw_set(
        (0..n)
            .map(|i| {
                let text = order_text(i);
                comp(i, "text", &text, 40, 100 + 120 * i as i32, 600, 80)
            })
            .collect(),
    )
}

pub fn order_text(i: usize) -> String {
    format!("Order #{}", 1001 + i)
}

/// Final components mirroring `raw` one-to-one, as a keep-everything plan
/// would produce them.
pub fn kept_copies(raw: &RawComponentSet) -> Vec<Component> {
    raw.components
        .iter()
        .map(|c| {
            let mut k = c.clone();
            k.original_index = Some(c.index);
            k
        })
        .collect()
}

pub fn texts(components: &[Component]) -> Vec<String> {
    components.iter().map(|c| c.text.clone()).collect()
}
