use alloy::primitives::U256;
use alloy::sol_types::SolCall;
use submitter_chain_client_interface::ChainRecord;

use crate::clients::UsageLedgerContract::insertUserHistoryCall;

/// Splits a batch into the four parallel arrays `insertUserHistory` expects.
/// Every array has one entry per record, in batch order.
pub fn build_insert_user_history_call(records: &[ChainRecord]) -> insertUserHistoryCall {
    let mut user_ids = Vec::with_capacity(records.len());
    let mut durations = Vec::with_capacity(records.len());
    let mut consumer_rewards = Vec::with_capacity(records.len());
    let mut owner_rewards = Vec::with_capacity(records.len());

    for record in records {
        user_ids.push(record.user_id.clone());
        durations.push(U256::from(record.duration_seconds));
        consumer_rewards.push(record.consumer_reward_fixed);
        owner_rewards.push(record.owner_reward_fixed);
    }

    insertUserHistoryCall {
        userIds: user_ids,
        totalDurations: durations,
        totalRewardsConsumers: consumer_rewards,
        totalRewardsContentOwners: owner_rewards,
    }
}

/// ABI encoded calldata (selector included) for a batch.
pub fn encode_insert_user_history(records: &[ChainRecord]) -> Vec<u8> {
    build_insert_user_history_call(records).abi_encode()
}
