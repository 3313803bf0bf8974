//! Inner contracts: fixed-address pseudo-contracts whose calls are encoded as
//! `opcode + positional parameters` RLP payloads instead of ABI-selector
//! calls.
//!
//! The catalogue below covers the staking, delegation, reward, governance,
//! slashing and restricting-plan operations. Functions without a registered
//! formatter still encode and decode; their results come back as raw
//! positional data.

use alloy_primitives::{address, Address};

mod codec;
mod contract;
mod error_code;
mod formatters;

pub use codec::{decode_event_payload, decode_rlp, encode_call, RlpItem};
pub use contract::{decode_event, decode_result, EventData, EventDecoder, InnerContract};
pub use error_code::error_message;
pub use formatters::{
    event_shape, param_abis, result_format, EventField, EventShape, ResultFormat, ValueTransform,
    DEFAULT_PARAM_ABIS,
};

/// Numeric opcode selecting an inner-contract operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

impl FunctionId {
    // staking
    /// Create a validator staking.
    pub const STAKING_CREATE_STAKING: Self = Self(1000);
    /// Edit an existing candidate.
    pub const STAKING_EDIT_STAKING: Self = Self(1001);
    /// Increase an existing staking.
    pub const STAKING_INCREASE_STAKING: Self = Self(1002);
    /// Withdraw a staking.
    pub const STAKING_WITHDREW_STAKING: Self = Self(1003);
    /// Current verifier set.
    pub const STAKING_GET_VERIFIER_LIST: Self = Self(1100);
    /// Current validator set.
    pub const STAKING_GET_VALIDATOR_LIST: Self = Self(1101);
    /// All candidates.
    pub const STAKING_GET_CANDIDATE_LIST: Self = Self(1102);
    /// One candidate's details.
    pub const STAKING_GET_CANDIDATE_INFO: Self = Self(1105);
    /// Per-block reward.
    pub const STAKING_GET_BLOCK_REWARD: Self = Self(1200);
    /// Per-epoch staking reward.
    pub const STAKING_GET_STAKING_REWARD: Self = Self(1201);
    /// Average block time.
    pub const STAKING_GET_AVG_BLOCK_TIME: Self = Self(1202);

    // delegate
    /// Delegate to a candidate.
    pub const DELEGATE_DELEGATE: Self = Self(1004);
    /// Withdraw a delegation.
    pub const DELEGATE_WITHDREW_DELEGATE: Self = Self(1005);
    /// Redeem matured undelegations.
    pub const DELEGATE_REDEEM_DELEGATE: Self = Self(1006);
    /// Nodes an address delegates to.
    pub const DELEGATE_GET_DELEGATE_LIST: Self = Self(1103);
    /// One delegation's details.
    pub const DELEGATE_GET_DELEGATE_INFO: Self = Self(1104);
    /// Locked-delegation details.
    pub const DELEGATE_GET_DELEGATE_LOCK_INFO: Self = Self(1106);

    // reward
    /// Withdraw accumulated delegation rewards.
    pub const REWARD_WITHDRAW_DELEGATE_REWARD: Self = Self(5000);
    /// Outstanding delegation rewards.
    pub const REWARD_GET_DELEGATE_REWARD: Self = Self(5100);

    // proposal
    /// Submit a text proposal.
    pub const PROPOSAL_SUBMIT_TEXT: Self = Self(2000);
    /// Submit a version proposal.
    pub const PROPOSAL_SUBMIT_VERSION: Self = Self(2001);
    /// Submit a parameter proposal.
    pub const PROPOSAL_SUBMIT_PARAM: Self = Self(2002);
    /// Vote on a proposal.
    pub const PROPOSAL_VOTE: Self = Self(2003);
    /// Declare a node's version.
    pub const PROPOSAL_DECLARE_VERSION: Self = Self(2004);
    /// Submit a cancel proposal.
    pub const PROPOSAL_SUBMIT_CANCEL: Self = Self(2005);
    /// Fetch one proposal.
    pub const PROPOSAL_GET_PROPOSAL: Self = Self(2100);
    /// Fetch a proposal's outcome.
    pub const PROPOSAL_GET_RESULT: Self = Self(2101);
    /// List proposals.
    pub const PROPOSAL_LIST: Self = Self(2102);
    /// Effective chain version.
    pub const PROPOSAL_GET_CHAIN_VERSION: Self = Self(2103);
    /// One governable parameter.
    pub const PROPOSAL_GET_GOVERN_PARAM: Self = Self(2104);
    /// Votes cast on a proposal.
    pub const PROPOSAL_GET_PROPOSAL_VOTES: Self = Self(2105);
    /// List governable parameters.
    pub const PROPOSAL_GOVERN_PARAM_LIST: Self = Self(2106);

    // slashing
    /// Report a duplicate signature.
    pub const SLASHING_REPORT_DUPLICATE_SIGN: Self = Self(3000);
    /// Check a duplicate-sign report.
    pub const SLASHING_CHECK_DUPLICATE_SIGN: Self = Self(3001);
    /// Nodes that produced no blocks.
    pub const SLASHING_ZERO_PRODUCE_NODE_LIST: Self = Self(3002);

    // restricting
    /// Create a restricting plan.
    pub const RESTRICTING_CREATE: Self = Self(4000);
    /// Fetch a restricting plan.
    pub const RESTRICTING_GET_INFO: Self = Self(4100);
}

/// Address of the restricting-plan contract.
pub const RESTRICTING_ADDRESS: Address = address!("1000000000000000000000000000000000000001");
/// Address of the staking contract.
pub const STAKING_ADDRESS: Address = address!("1000000000000000000000000000000000000002");
/// Address of the slashing contract.
pub const SLASHING_ADDRESS: Address = address!("1000000000000000000000000000000000000004");
/// Address of the governance contract.
pub const PROPOSAL_ADDRESS: Address = address!("1000000000000000000000000000000000000005");
/// Address of the delegate-reward pool contract.
pub const REWARD_ADDRESS: Address = address!("1000000000000000000000000000000000000006");
