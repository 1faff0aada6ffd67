//! Contract bindings
//!
//! Typed interfaces for the two greeters and for the rollup system contracts
//! the demo talks to, plus the L1 to L2 address aliasing rule.

use alloy::{
    primitives::{address, Address, U160},
    sol,
};

/// ArbWasm precompile, activates Stylus programs
pub const ARB_WASM_ADDRESS: Address = address!("0000000000000000000000000000000000000071");

/// ArbRetryableTx precompile, owns retryable tickets
pub const ARB_RETRYABLE_TX_ADDRESS: Address = address!("000000000000000000000000000000000000006e");

/// NodeInterface virtual contract, only reachable through `eth_call`/`eth_estimateGas`
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000c8");

/// Bridge message kind of a retryable ticket submission
pub const L1_MESSAGE_TYPE_SUBMIT_RETRYABLE_TX: u8 = 9;

/// Offset added to an L1 contract address to get the address it acts as on L2
const ALIAS_OFFSET: U160 = U160::from_limbs([0x0000_0000_0000_1111, 0x0000_0000_0000_0000, 0x1111_0000]);

sol! {
    /// Greeter deployed on L1, forwards greetings to L2 through the inbox
    #[sol(rpc)]
    contract GreeterL1 {
        constructor(string _greeting, address _l2Target, address _inbox);

        function greet() external view returns (string);
        function updateL2Target(address _l2Target) external;
        function setGreetingInL2(
            string _greeting,
            uint256 maxSubmissionCost,
            uint256 maxGas,
            uint256 gasPriceBid
        ) external payable returns (uint256);
    }

    /// Stylus greeter deployed on L2, only its L1 counterpart may set the greeting
    #[sol(rpc)]
    interface GreeterL2 {
        function getL1Target() external view returns (address);
        function updateL1Target(address l1_target) external;
        function greet() external view returns (string);
        function setGreeting(string greeting) external;
        function setGreetingInL1(string greeting) external returns (uint256);
    }

    #[sol(rpc)]
    interface ArbWasm {
        function activateProgram(address program) external payable returns (uint16 version, uint256 dataFee);
    }

    #[sol(rpc)]
    interface NodeInterface {
        function estimateRetryableTicket(
            address sender,
            uint256 deposit,
            address to,
            uint256 l2CallValue,
            address excessFeeRefundAddress,
            address callValueRefundAddress,
            bytes data
        ) external;
    }

    #[sol(rpc)]
    interface ArbRetryableTx {
        function getTimeout(bytes32 ticketId) external view returns (uint256);

        event RedeemScheduled(
            bytes32 indexed ticketId,
            bytes32 indexed retryTxHash,
            uint64 indexed sequenceNum,
            uint64 donatedGas,
            address gasDonor,
            uint256 maxRefund,
            uint256 submissionFeeRefund
        );
    }

    #[sol(rpc)]
    interface IInbox {
        function bridge() external view returns (address);
        function calculateRetryableSubmissionFee(uint256 dataLength, uint256 baseFee) external view returns (uint256);

        event InboxMessageDelivered(uint256 indexed messageNum, bytes data);
    }

    interface IBridge {
        event MessageDelivered(
            uint256 indexed messageIndex,
            bytes32 indexed beforeInboxAcc,
            address inbox,
            uint8 kind,
            address sender,
            bytes32 messageDataHash,
            uint256 baseFeeL1,
            uint64 timestamp
        );
    }
}

/// Address an L1 contract acts as when its messages execute on L2
pub fn apply_l1_to_l2_alias(l1_address: Address) -> Address {
    let value = U160::from_be_bytes(l1_address.into_array()).wrapping_add(ALIAS_OFFSET);
    Address::from(value.to_be_bytes::<20>())
}

/// Inverse of [`apply_l1_to_l2_alias`]
pub fn undo_l1_to_l2_alias(l2_address: Address) -> Address {
    let value = U160::from_be_bytes(l2_address.into_array()).wrapping_sub(ALIAS_OFFSET);
    Address::from(value.to_be_bytes::<20>())
}
