//! Status codes emitted by inner-contract operations and events.

/// Human-readable message for an inner-contract status code.
///
/// Unregistered codes fall back to `"Unknown error code"`.
pub fn error_message(code: u64) -> &'static str {
    match code {
        0 => "ok",
        1 => "System error",
        2 => "Object not found",
        3 => "Invalid parameter",
        4 => "Operation not authorized",
        5 => "Insufficient balance",
        6 => "Invalid signature",
        7 => "Encoding failed",

        // staking
        301000 => "The bls key length is wrong",
        301001 => "The bls key proof is wrong",
        301002 => "The program version signature is wrong",
        301003 => "The program version is too low",
        301004 => "The staking deposit is too low",
        301005 => "The candidate already exists",
        301006 => "The candidate does not exist",
        301007 => "The candidate status is invalid",
        301008 => "The account of the staking is wrong",

        // delegation
        301100 => "The delegate deposit is too low",
        301101 => "The account is not allowed to delegate",
        301102 => "The delegation does not exist",
        301103 => "The withdrawal amount is higher than the delegation",
        301104 => "The delegation info is wrong",

        // governance
        302001 => "The proposal does not exist",
        302002 => "The proposal type is wrong",
        302003 => "The vote option is invalid",
        302004 => "The voting stage has ended",
        302005 => "The declared version is wrong",

        // slashing
        303000 => "The duplicate-sign evidence is invalid",
        303001 => "The reported node does not exist",

        // restricting
        304001 => "The restricting plan list is too long",
        304002 => "The restricting epoch is invalid",
        304003 => "The total restricting amount is too low",
        304004 => "The release address is wrong",

        _ => "Unknown error code",
    }
}
