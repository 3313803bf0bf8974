//! Per-function formatter tables for inner-contract parameters, results and
//! events.
//!
//! Result formatters reshape the JSON `Ret` payload of a call; event
//! formatters zip RLP positional arguments against named fields. Formatter
//! shape is a tagged variant fixed at table-construction time, never inferred
//! from the data.

use super::FunctionId;
use bubble_common::abi::ParamType;

/// Fallback parameter types for field names common across functions.
pub const DEFAULT_PARAM_ABIS: &[(&str, ParamType)] = &[
    ("address", ParamType::Address),
    ("node_id", ParamType::Bytes),
    ("proposal_id", ParamType::Bytes),
];

const CREATE_STAKING_PARAM_ABIS: &[(&str, ParamType)] = &[
    ("benefit_address", ParamType::Address),
    ("node_id", ParamType::Bytes),
    ("version_sign", ParamType::Bytes),
    ("bls_pubkey", ParamType::Bytes),
    ("bls_proof", ParamType::Bytes),
];

const EDIT_CANDIDATE_PARAM_ABIS: &[(&str, ParamType)] =
    &[("benefit_address", ParamType::Address), ("node_id", ParamType::Bytes)];

const GET_DELEGATE_PARAM_ABIS: &[(&str, ParamType)] =
    &[("delegate_address", ParamType::Address)];

const VERSION_SIGN_PARAM_ABIS: &[(&str, ParamType)] = &[("version_sign", ParamType::Bytes)];

const RESTRICTING_PARAM_ABIS: &[(&str, ParamType)] = &[("release_address", ParamType::Address)];

/// The per-function parameter type table, when one is registered.
pub fn param_abis(fid: FunctionId) -> Option<&'static [(&'static str, ParamType)]> {
    match fid {
        FunctionId::STAKING_CREATE_STAKING => Some(CREATE_STAKING_PARAM_ABIS),
        FunctionId::STAKING_EDIT_STAKING => Some(EDIT_CANDIDATE_PARAM_ABIS),
        FunctionId::DELEGATE_GET_DELEGATE_LIST
        | FunctionId::DELEGATE_GET_DELEGATE_INFO
        | FunctionId::DELEGATE_GET_DELEGATE_LOCK_INFO => Some(GET_DELEGATE_PARAM_ABIS),
        FunctionId::PROPOSAL_VOTE | FunctionId::PROPOSAL_DECLARE_VERSION => {
            Some(VERSION_SIGN_PARAM_ABIS)
        }
        FunctionId::RESTRICTING_CREATE | FunctionId::RESTRICTING_GET_INFO => {
            Some(RESTRICTING_PARAM_ABIS)
        }
        _ => None,
    }
}

/// A transform applied to one JSON field of a result payload.
#[derive(Debug, Clone, Copy)]
pub enum ValueTransform {
    /// Hex quantity string to a JSON number; other shapes pass through.
    UintFromHex,
    /// Normalize to a `0x`-prefixed lowercase hex string.
    HexString,
    /// A nullable list of objects, each reformatted field-wise.
    DictList(&'static [(&'static str, ValueTransform)]),
}

/// How a function's result payload is reshaped.
#[derive(Debug, Clone, Copy)]
pub enum ResultFormat {
    /// A single scalar value.
    Scalar(ValueTransform),
    /// An object with per-field transforms.
    Dict(&'static [(&'static str, ValueTransform)]),
    /// A list of objects sharing the same per-field transforms.
    ArrayOfDict(&'static [(&'static str, ValueTransform)]),
}

const RESTRICTING_PLAN_FIELDS: &[(&str, ValueTransform)] =
    &[("amount", ValueTransform::UintFromHex)];

const RESTRICTING_INFO_FIELDS: &[(&str, ValueTransform)] = &[
    ("balance", ValueTransform::UintFromHex),
    ("Pledge", ValueTransform::UintFromHex),
    ("debt", ValueTransform::UintFromHex),
    ("plans", ValueTransform::DictList(RESTRICTING_PLAN_FIELDS)),
];

const CANDIDATE_INFO_FIELDS: &[(&str, ValueTransform)] = &[
    ("Shares", ValueTransform::UintFromHex),
    ("Released", ValueTransform::UintFromHex),
    ("ReleasedHes", ValueTransform::UintFromHex),
    ("RestrictingPlan", ValueTransform::UintFromHex),
    ("RestrictingPlanHes", ValueTransform::UintFromHex),
    ("DelegateTotal", ValueTransform::UintFromHex),
    ("DelegateTotalHes", ValueTransform::UintFromHex),
    ("DelegateRewardTotal", ValueTransform::UintFromHex),
];

const VERIFIER_INFO_FIELDS: &[(&str, ValueTransform)] = &[
    ("Shares", ValueTransform::UintFromHex),
    ("DelegateTotal", ValueTransform::UintFromHex),
    ("DelegateRewardTotal", ValueTransform::UintFromHex),
];

const DELEGATE_INFO_FIELDS: &[(&str, ValueTransform)] = &[
    ("Released", ValueTransform::UintFromHex),
    ("ReleasedHes", ValueTransform::UintFromHex),
    ("RestrictingPlan", ValueTransform::UintFromHex),
    ("RestrictingPlanHes", ValueTransform::UintFromHex),
    ("CumulativeIncome", ValueTransform::UintFromHex),
    ("LockReleasedHes", ValueTransform::UintFromHex),
    ("LockRestrictingPlanHes", ValueTransform::UintFromHex),
];

const LOCKED_DELEGATE_FIELDS: &[(&str, ValueTransform)] = &[
    ("Released", ValueTransform::UintFromHex),
    ("RestrictingPlan", ValueTransform::UintFromHex),
];

const DELEGATE_LOCK_INFO_FIELDS: &[(&str, ValueTransform)] = &[
    ("Locks", ValueTransform::DictList(LOCKED_DELEGATE_FIELDS)),
    ("Released", ValueTransform::UintFromHex),
    ("RestrictingPlan", ValueTransform::UintFromHex),
];

const DELEGATE_REWARD_FIELDS: &[(&str, ValueTransform)] =
    &[("reward", ValueTransform::UintFromHex)];

/// The registered result formatter for a function, if any.
pub fn result_format(fid: FunctionId) -> Option<&'static ResultFormat> {
    match fid {
        FunctionId::RESTRICTING_GET_INFO => {
            Some(&ResultFormat::Dict(RESTRICTING_INFO_FIELDS))
        }
        FunctionId::STAKING_GET_CANDIDATE_LIST => {
            Some(&ResultFormat::ArrayOfDict(CANDIDATE_INFO_FIELDS))
        }
        FunctionId::STAKING_GET_VERIFIER_LIST | FunctionId::STAKING_GET_VALIDATOR_LIST => {
            Some(&ResultFormat::ArrayOfDict(VERIFIER_INFO_FIELDS))
        }
        FunctionId::STAKING_GET_CANDIDATE_INFO => {
            Some(&ResultFormat::Dict(CANDIDATE_INFO_FIELDS))
        }
        FunctionId::STAKING_GET_BLOCK_REWARD | FunctionId::STAKING_GET_STAKING_REWARD => {
            Some(&ResultFormat::Scalar(ValueTransform::UintFromHex))
        }
        FunctionId::DELEGATE_GET_DELEGATE_INFO => Some(&ResultFormat::Dict(DELEGATE_INFO_FIELDS)),
        FunctionId::DELEGATE_GET_DELEGATE_LOCK_INFO => {
            Some(&ResultFormat::Dict(DELEGATE_LOCK_INFO_FIELDS))
        }
        FunctionId::REWARD_GET_DELEGATE_REWARD => {
            Some(&ResultFormat::ArrayOfDict(DELEGATE_REWARD_FIELDS))
        }
        _ => None,
    }
}

/// How one RLP positional argument becomes a JSON value.
#[derive(Debug, Clone, Copy)]
pub enum EventField {
    /// Minimal big-endian bytes to a JSON number.
    Uint,
    /// Raw bytes to a `0x`-prefixed hex string.
    Hex,
}

/// How a function's event arguments map to named fields.
#[derive(Debug, Clone, Copy)]
pub enum EventShape {
    /// Arguments zip positionally into one flat object.
    Dict(&'static [(&'static str, EventField)]),
    /// The single argument is a list of tuples, each zipping into an object.
    ArrayOfDict(&'static [(&'static str, EventField)]),
}

const WITHDREW_DELEGATE_EVENT_FIELDS: &[(&str, EventField)] = &[
    ("delegateIncome", EventField::Uint),
    ("released", EventField::Uint),
    ("restrictingPlan", EventField::Uint),
    ("lockReleased", EventField::Uint),
    ("lockRestrictingPlan", EventField::Uint),
];

const REDEEM_DELEGATE_EVENT_FIELDS: &[(&str, EventField)] =
    &[("released", EventField::Uint), ("restrictingPlan", EventField::Uint)];

const WITHDRAW_DELEGATE_REWARD_EVENT_FIELDS: &[(&str, EventField)] = &[
    ("NodeID", EventField::Hex),
    ("StakingNum", EventField::Uint),
    ("Reward", EventField::Uint),
];

/// The registered event shape for a function, if any.
pub fn event_shape(fid: FunctionId) -> Option<&'static EventShape> {
    match fid {
        FunctionId::DELEGATE_WITHDREW_DELEGATE => {
            Some(&EventShape::Dict(WITHDREW_DELEGATE_EVENT_FIELDS))
        }
        FunctionId::DELEGATE_REDEEM_DELEGATE => {
            Some(&EventShape::Dict(REDEEM_DELEGATE_EVENT_FIELDS))
        }
        FunctionId::REWARD_WITHDRAW_DELEGATE_REWARD => {
            Some(&EventShape::ArrayOfDict(WITHDRAW_DELEGATE_REWARD_EVENT_FIELDS))
        }
        _ => None,
    }
}
