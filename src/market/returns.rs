//! Bounded asset returns from correlated shocks.

use crate::types::asset::AssetParameters;

/// `clamp(mean + std_dev * z, min, max)`.
#[inline]
pub fn compute_return(asset: &AssetParameters, correlated_z: f64) -> f64 {
    asset.clamp(asset.mean_return + asset.std_dev * correlated_z)
}
