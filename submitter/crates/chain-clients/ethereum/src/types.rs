use alloy::network::Ethereum;
use alloy::providers::RootProvider;

pub type DefaultHttpProvider = RootProvider<Ethereum>;
