use alloy::sol;

sol! {
    #[allow(missing_docs)]
    interface UsageLedgerContract {
        function insertUserHistory(
            string[] calldata userIds,
            uint256[] calldata totalDurations,
            uint256[] calldata totalRewardsConsumers,
            uint256[] calldata totalRewardsContentOwners
        ) external;
    }
}
