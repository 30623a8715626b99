//! Solidity interfaces of the contracts the dashboard reads.

use alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function totalSupply() external view returns (uint256);
        function balanceOf(address owner) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
    }

    interface ICToken {
        function totalReserves() external view returns (uint256);
    }

    interface IMultisig {
        function getOwners() external view returns (address[]);
        function getThreshold() external view returns (uint256);
    }

    interface IFed {
        function supply() external view returns (uint256);
    }

    interface IXChainFed {
        function dstSupply() external view returns (uint256);
    }

    interface IStabilizer {
        function supply() external view returns (uint256);
    }

    interface IGovernor {
        function proposalCount() external view returns (uint256);
        function quorumVotes() external view returns (uint256);
        function proposals(uint256 proposalId) external view returns (
            uint256 id,
            address proposer,
            uint256 eta,
            uint256 startBlock,
            uint256 endBlock,
            uint256 forVotes,
            uint256 againstVotes,
            bool canceled,
            bool executed
        );

        event ProposalCreated(
            uint256 id,
            address proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 startBlock,
            uint256 endBlock,
            string description
        );
        event VoteCast(address voter, uint256 proposalId, bool support, uint256 votes);
    }
}
