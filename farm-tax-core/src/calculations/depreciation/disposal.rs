use rust_decimal::Decimal;
use tracing::debug;

use crate::DisposalResult;
use crate::calculations::common::round_half_up;

/// Gain or loss on disposing of an asset: proceeds less book value.
pub fn dispose(
    book_value: Decimal,
    proceeds: Decimal,
) -> DisposalResult {
    let gain_loss = round_half_up(proceeds - book_value);

    debug!(
        book_value = %book_value,
        proceeds = %proceeds,
        gain_loss = %gain_loss,
        "Recorded asset disposal"
    );

    DisposalResult {
        book_value,
        proceeds,
        gain_loss,
        is_gain: gain_loss > Decimal::ZERO,
    }
}
