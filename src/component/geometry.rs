use crate::component::component_model::Component;

/// Stable sort into reading order: top-to-bottom, then left-to-right.
/// Components sharing a `(y, x)` origin keep their relative order.
pub fn sort_reading_order(components: &mut [Component]) {
    components.sort_by_key(|c| (c.bounds.y, c.bounds.x));
}

/// Reassign `index` as `0..N-1` following the current order.
pub fn reindex(components: &mut [Component]) {
    for (i, c) in components.iter_mut().enumerate() {
        c.index = i;
    }
}

/// Sort into reading order and reindex. Returns the permutation applied:
/// `order[new_position] == old_position`.
pub fn canonical_order(components: &mut Vec<Component>) -> Vec<usize> {
    let mut tagged: Vec<(usize, Component)> = components.drain(..).enumerate().collect();
    tagged.sort_by_key(|(_, c)| (c.bounds.y, c.bounds.x));

    let mut order = Vec::with_capacity(tagged.len());
    for (old, c) in tagged {
        order.push(old);
        components.push(c);
    }
    reindex(components);
    order
}
