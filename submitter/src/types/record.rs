use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Deserializer};

/// One computed usage row per (user, job), as exported by the analytics query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UsageRecord {
    #[serde(rename = "userId")]
    pub user_id: String,

    #[serde(rename = "JOB_ID", alias = "jobId")]
    pub job_id: String,

    #[serde(rename = "totalDuration")]
    pub duration_seconds: u64,

    #[serde(rename = "totalRewardsConsumer", deserialize_with = "deserialize_decimal")]
    pub consumer_reward: BigDecimal,

    #[serde(rename = "totalRewardsContentOwner", deserialize_with = "deserialize_decimal")]
    pub owner_reward: BigDecimal,
}

impl UsageRecord {
    pub fn new(
        user_id: impl Into<String>,
        job_id: impl Into<String>,
        duration_seconds: u64,
        consumer_reward: BigDecimal,
        owner_reward: BigDecimal,
    ) -> Self {
        Self { user_id: user_id.into(), job_id: job_id.into(), duration_seconds, consumer_reward, owner_reward }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DecimalRepr {
    Number(serde_json::Number),
    Text(String),
}

/// Reads a decimal from either a JSON number or a string.
/// Numbers go through their shortest textual form so `0.1` stays exactly `0.1`.
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<BigDecimal, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match DecimalRepr::deserialize(deserializer)? {
        DecimalRepr::Number(number) => number.to_string(),
        DecimalRepr::Text(text) => text,
    };
    BigDecimal::from_str(text.trim()).map_err(serde::de::Error::custom)
}
