//! A stand-in execution backend for the harness.
//!
//! Real block production lives behind the rollup state machine and is out
//! of scope here; the harness instead stamps deterministic headers derived
//! from the consumed message, which is enough to exercise the whole inbox
//! pipeline and the tape sink end to end.

use alloy_consensus::Header;
use alloy_primitives::{keccak256, B256};
use vela_derive::{InitMessage, L1IncomingMessage, MessageWithMetadata};
use vela_genesis::ChainConfig;
use vela_proof::{
    nonce_from_delayed, BatchFetcher, ExecutionBackend, HeaderExtraInfo, HeaderReader,
    OracleProviderError, StateMode, SystemState,
};

/// The harness execution stub.
#[derive(Debug)]
pub struct HarnessExecution {
    system: SystemState,
    state_root: B256,
}

impl HarnessExecution {
    /// Creates a stub that reports the given system state.
    pub fn new(system: SystemState) -> Self {
        Self { system, state_root: B256::ZERO }
    }

    fn stamp(header: &mut Header, send_root: B256, version: u64, l1_block_number: u64) {
        HeaderExtraInfo { send_root, arbos_format_version: version, l1_block_number }
            .apply(header);
    }
}

impl ExecutionBackend for HarnessExecution {
    type Error = OracleProviderError;

    fn open_state(&mut self, state_root: B256, _mode: StateMode) -> Result<(), Self::Error> {
        self.state_root = state_root;
        Ok(())
    }

    fn system_state(&mut self) -> Result<SystemState, Self::Error> {
        Ok(self.system.clone())
    }

    fn produce_block(
        &mut self,
        prior: &Header,
        message: &MessageWithMetadata,
        config: &ChainConfig,
        context: &dyn HeaderReader,
        fetcher: &dyn BatchFetcher,
    ) -> Result<Header, Self::Error> {
        // Ancestor reads go through the witness context; a tape whose
        // parent header is committed at a different height is corrupt.
        if !prior.parent_hash.is_zero() {
            context.header_by_number(prior.parent_hash, prior.number.saturating_sub(1))?;
        }

        // Batch posting reports price the batch they reference.
        let mut gas_used = 0;
        if message.message.kind == L1IncomingMessage::KIND_BATCH_POSTING_REPORT {
            if let Ok((batch_num, _)) = message.message.batch_posting_report() {
                gas_used = fetcher.fetch(batch_num)?.len() as u64 * 16;
            }
        }

        let mut preimage = self.state_root.to_vec();
        preimage.extend_from_slice(&message.message.payload);
        let mut header = Header {
            parent_hash: prior.hash_slow(),
            number: prior.number + 1,
            timestamp: message.message.timestamp,
            gas_limit: prior.gas_limit,
            gas_used,
            nonce: nonce_from_delayed(message.delayed_messages_read),
            state_root: keccak256(&preimage),
            ..Default::default()
        };
        Self::stamp(
            &mut header,
            keccak256(&message.message.payload),
            config.arbitrum.initial_arbos_version,
            message.message.block_number,
        );
        Ok(header)
    }

    fn initialize_genesis(
        &mut self,
        init: &InitMessage,
        config: &ChainConfig,
    ) -> Result<Header, Self::Error> {
        let mut header = Header {
            number: config.arbitrum.genesis_block_num,
            nonce: nonce_from_delayed(0),
            state_root: keccak256(init.chain_id.to_be_bytes()),
            ..Default::default()
        };
        Self::stamp(&mut header, B256::ZERO, config.arbitrum.initial_arbos_version, 0);
        Ok(header)
    }
}
