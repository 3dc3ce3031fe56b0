use crate::{
    error::{StopmoError, StopmoResult},
    session::{Item, MIN_TOTAL_DURATION_MS},
};

/// Sum of `duration_ms` over included items. 0 when nothing is included.
pub fn recompute_total(items: &[Item]) -> u64 {
    items
        .iter()
        .filter(|it| it.included)
        .map(|it| it.duration_ms)
        .sum()
}

/// Redistribute durations across included items so their sum approximates
/// `target_total_ms`.
///
/// When the current included sum is nonzero, every included item receives
/// `old * target / current` under integer floor division; each item truncates
/// independently, so the new sum may fall short of the target by up to one
/// millisecond per included item. When the current sum is zero, the target is
/// split evenly (`target / count` each) and the remainder is dropped.
/// Excluded items are never modified.
pub fn rescale_to_total(items: &mut [Item], target_total_ms: u64) -> StopmoResult<()> {
    if target_total_ms < MIN_TOTAL_DURATION_MS {
        return Err(StopmoError::validation(format!(
            "target total must be >= {MIN_TOTAL_DURATION_MS} ms, got {target_total_ms}"
        )));
    }

    let included = items.iter().filter(|it| it.included).count() as u64;
    if included == 0 {
        return Ok(());
    }

    let current_total = recompute_total(items);
    if current_total == 0 {
        let each = target_total_ms / included;
        for item in items.iter_mut().filter(|it| it.included) {
            item.duration_ms = each;
        }
        return Ok(());
    }

    for item in items.iter_mut().filter(|it| it.included) {
        // u128 keeps the product exact; the division is then a true floor.
        let scaled =
            u128::from(item.duration_ms) * u128::from(target_total_ms) / u128::from(current_total);
        item.duration_ms = scaled as u64;
    }

    Ok(())
}
