//! Contract access layer: ABI surface and typed read/write handles.
//!
//! The three platform contracts are opaque external services; this module only
//! resolves their addresses for the active chain and hands out `alloy` contract
//! instances bound to either the shared read provider or the connected wallet.

use alloy::{primitives::Address, providers::DynProvider, sol};

use crate::{
    config::{contract_address, ContractName},
    error::ClientError,
};

sol! {
    #[sol(rpc)]
    interface IVaiToken {
        function approve(address spender, uint256 value) external returns (bool);
        function balanceOf(address owner) external view returns (uint256 balance);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function decimals() external view returns (uint8);

        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}

sol! {
    #[sol(rpc)]
    interface IMembership {
        struct MemberInfo {
            uint256 adaptation;
            address referrer;
            uint256 totalEarnings;
            uint256 referralEarnings;
            uint256 referralCount;
            bool isActive;
            uint256 joinedAt;
        }

        function join() external;
        function join(address refId) external;
        function isMember(address memberAddr) external view returns (bool);
        function getMemberInfo(address memberAddr) external view returns (MemberInfo memory);
        function getClaimableCommissions(address member) external view returns (uint256);
        function getReferralEarnings(address member) external view returns (uint256);
        function claimCommissions() external;

        event CommissionClaimed(address indexed member, uint256 amount);
    }
}

sol! {
    #[sol(rpc)]
    interface IBootstrapBay {
        struct RoundInfo {
            uint256 entry;
            uint256 pool;
            uint256 slots;
            uint256 reserve;
            uint256 deadline;
            bool isActive;
        }

        struct ContributorInfo {
            uint256 contribution;
            uint256 referralBonus;
            bool hasWithdrawn;
            address referrer;
            uint256 contributedAt;
        }

        function contribute() external payable;
        function getCurrentRound() external view returns (RoundInfo memory);
        function getContributorInfo(address contributor) external view returns (ContributorInfo memory);
        function getRoundStatistics() external view returns (
            uint256 contributions,
            uint256 contributorsCount,
            uint256 referralBonuses,
            uint256 availableSlots,
            bool isActive,
            bool rewardsCalculated
        );
        function claimRewards() external;

        event ContributionMade(address indexed contributor, uint256 amount, address indexed referrer);
        event RewardClaimed(address indexed contributor, uint256 bnbAmount, uint256 vaiAmount);
    }
}

/// Which provider a contract handle is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallMode {
    /// Shared public client; read-only calls.
    Read,
    /// Connected wallet; required for state-changing calls.
    Sign,
}

/// Resolves contract handles for the active chain.
///
/// Address configuration is re-read on every handle request, so environment
/// changes apply without rebuilding the service.
#[derive(Clone)]
pub struct ContractService {
    chain_id: u64,
    public: DynProvider,
    wallet: Option<DynProvider>,
    signer_address: Option<Address>,
}

impl ContractService {
    /// Read-only service over a shared public provider.
    pub fn new(chain_id: u64, public: DynProvider) -> Self {
        Self {
            chain_id,
            public,
            wallet: None,
            signer_address: None,
        }
    }

    /// Attach a wallet-backed provider for signing calls.
    pub fn with_wallet(mut self, wallet: DynProvider, signer_address: Address) -> Self {
        self.wallet = Some(wallet);
        self.signer_address = Some(signer_address);
        self
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Address of the connected signer, if any.
    pub fn signer_address(&self) -> Option<Address> {
        self.signer_address
    }

    /// The shared read provider (native balance queries, log scans).
    pub fn public_provider(&self) -> &DynProvider {
        &self.public
    }

    fn provider(&self, mode: CallMode, operation: &'static str) -> Result<DynProvider, ClientError> {
        match mode {
            CallMode::Read => Ok(self.public.clone()),
            CallMode::Sign => self
                .wallet
                .clone()
                .ok_or(ClientError::NoSigner { operation }),
        }
    }

    pub fn vai_token(
        &self,
        mode: CallMode,
    ) -> Result<IVaiToken::IVaiTokenInstance<DynProvider>, ClientError> {
        let address = contract_address(self.chain_id, ContractName::VaiToken)?;
        Ok(IVaiToken::new(address, self.provider(mode, "token call")?))
    }

    pub fn membership(
        &self,
        mode: CallMode,
    ) -> Result<IMembership::IMembershipInstance<DynProvider>, ClientError> {
        let address = contract_address(self.chain_id, ContractName::Membership)?;
        Ok(IMembership::new(address, self.provider(mode, "membership call")?))
    }

    pub fn bootstrap_bay(
        &self,
        mode: CallMode,
    ) -> Result<IBootstrapBay::IBootstrapBayInstance<DynProvider>, ClientError> {
        let address = contract_address(self.chain_id, ContractName::BootstrapBay)?;
        Ok(IBootstrapBay::new(address, self.provider(mode, "bootstrap call")?))
    }
}
