use crate::utils::error::{PointsError, Result};

pub const BONUS_MULTIPLIER: u32 = 2;
pub const BASE_MULTIPLIER: u32 = 1;

/// Points awarded per disposal: double while the receptacle is at most half full.
///
/// `fill / capacity <= 1/2` is evaluated as `2 * fill <= capacity` in integers,
/// so there is no rounding at the boundary.
pub fn multiplier(receptacle: &str, fill_amount: u64, capacity: i64) -> Result<u32> {
    if capacity <= 0 {
        return Err(PointsError::InvalidCapacity {
            name: receptacle.to_string(),
            capacity,
        });
    }

    if u128::from(fill_amount) * 2 <= capacity as u128 {
        Ok(BONUS_MULTIPLIER)
    } else {
        Ok(BASE_MULTIPLIER)
    }
}
