use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use num_bigint::{BigInt, Sign};
use tracing::info;

use crate::error::{FixedPointError, TransformError};
use crate::types::{ChainRecord, UsageRecord};

/// Number of decimals of the contract's fixed-point reward amounts.
pub const FIXED_POINT_DECIMALS: i64 = 18;

/// Scales `value` by 10^18 and truncates toward zero.
///
/// The arithmetic is done on the decimal's integer digits, so no precision is lost
/// for any input scale. Values that truncate to zero are zero whatever their sign;
/// anything else below zero is rejected.
pub fn to_fixed(value: &BigDecimal) -> Result<U256, FixedPointError> {
    // value == digits * 10^-exponent
    let (digits, exponent) = value.as_bigint_and_exponent();
    if digits.sign() == Sign::NoSign {
        return Ok(U256::ZERO);
    }

    let shift = FIXED_POINT_DECIMALS.saturating_sub(exponent);
    let scaled = if shift >= 0 {
        if shift > MAX_U256_DIGITS {
            return Err(out_of_range(value, &digits));
        }
        digits * pow10(shift.unsigned_abs())
    } else {
        // Dividing by more powers of ten than there are digits leaves nothing.
        if shift.unsigned_abs() > decimal_digits(&digits) {
            return Ok(U256::ZERO);
        }
        // BigInt division truncates toward zero.
        digits / pow10(shift.unsigned_abs())
    };

    if scaled.sign() == Sign::Minus {
        return Err(FixedPointError::Negative(value.clone()));
    }
    bigint_to_u256(&scaled).ok_or_else(|| FixedPointError::Overflow(value.clone()))
}

/// Decimal digits of 2^256 - 1. A nonzero value shifted further cannot fit.
const MAX_U256_DIGITS: i64 = 78;

fn out_of_range(value: &BigDecimal, digits: &BigInt) -> FixedPointError {
    if digits.sign() == Sign::Minus {
        FixedPointError::Negative(value.clone())
    } else {
        FixedPointError::Overflow(value.clone())
    }
}

fn decimal_digits(value: &BigInt) -> u64 {
    value.magnitude().to_str_radix(10).len() as u64
}

fn pow10(exponent: u64) -> BigInt {
    let exponent = u32::try_from(exponent).unwrap_or(u32::MAX);
    BigInt::from(10u8).pow(exponent)
}

fn bigint_to_u256(value: &BigInt) -> Option<U256> {
    let (sign, bytes) = value.to_bytes_be();
    if sign == Sign::Minus {
        return None;
    }
    U256::try_from_be_slice(&bytes)
}

/// Converts usage records one-to-one, in order, into their contract-native form.
pub fn transform_records(records: &[UsageRecord]) -> Result<Vec<ChainRecord>, TransformError> {
    let chain_records = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let fixed = |field: &'static str, value: &BigDecimal| {
                to_fixed(value).map_err(|source| TransformError {
                    index,
                    user_id: record.user_id.clone(),
                    job_id: record.job_id.clone(),
                    field,
                    source,
                })
            };
            Ok(ChainRecord {
                user_id: record.user_id.clone(),
                job_id: record.job_id.clone(),
                duration_seconds: record.duration_seconds,
                consumer_reward_fixed: fixed("totalRewardsConsumer", &record.consumer_reward)?,
                owner_reward_fixed: fixed("totalRewardsContentOwner", &record.owner_reward)?,
            })
        })
        .collect::<Result<Vec<_>, TransformError>>()?;

    info!(records = chain_records.len(), "Records prepared for insertion to the chain.");
    Ok(chain_records)
}
