//! The replay driver: prior header in, produced block hash and send root
//! out, everything in between fed by the tape.

use crate::{
    errors::ReplayError,
    executor::{ExecutionBackend, StateMode, TapeBatchFetcher},
    header::{delayed_messages_read, header_by_hash, ChainContext, HeaderExtraInfo},
    inbox::OracleInbox,
};
use alloc::{sync::Arc, vec::Vec};
use alloy_primitives::{hex, B256};
use tracing::{info, warn};
use vela_derive::{
    BlobReader, CelestiaReader, DaProvider, DaProviders, DasReader, InboxMultiplexer, InitMessage,
    KeysetValidationMode, MessageWithMetadata,
};
use vela_genesis::{chain_config_by_id, ArbitrumChainParams, ChainConfig};
use vela_preimage::TapeClient;

/// A signature over a zeroed digest by the key `0x..01`, used to warm the
/// secp256k1 basepoint tables into the cached early machine state.
const SAMPLE_SIGNATURE: &str = "a0b37f8fba683cc68f6574cd43b39f0343a50008bf6ccea9d13231d9e7e2e1e411edc8d307254296264aebfc3dc76cd8b668373a072fd64665b50000e9fcce5201";

/// The commitments a completed replay writes back through the tape sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// The produced block's hash.
    pub block_hash: B256,
    /// The produced block's send root.
    pub send_root: B256,
}

/// Drives one replay: reads the committed prior block hash, pops exactly
/// one message out of the inbox multiplexer, hands it to the execution
/// backend, and commits the produced hash and send root.
#[derive(Debug)]
pub struct ReplayDriver<T, E> {
    oracle: Arc<T>,
    backend: E,
}

impl<T, E> ReplayDriver<T, E>
where
    T: TapeClient + Send + Sync + 'static,
    E: ExecutionBackend,
{
    /// Creates a new driver over a tape handle and an execution backend.
    pub const fn new(oracle: Arc<T>, backend: E) -> Self {
        Self { oracle, backend }
    }

    /// Runs the replay to completion.
    pub async fn run(&mut self) -> Result<ReplayOutcome, ReplayError<E::Error>> {
        populate_ecdsa_cache();

        let last_block_hash = self.oracle.last_block_hash().await;
        info!(target: "replay", %last_block_hash, "initial state");

        let new_header = if last_block_hash.is_zero() {
            // Fresh chain: the first message must initialize the rollup
            // state machine and materialize the genesis block.
            let message = self.read_message(&ArbitrumChainParams::default(), 0).await?;
            let init = InitMessage::parse(&message.message)?;
            let config = match &init.chain_config {
                Some(config) => config.clone(),
                None => {
                    warn!(target: "replay", chain_id = init.chain_id, "init message carries no chain config, falling back to the compiled-in table");
                    chain_config_by_id(init.chain_id)
                        .ok_or(ReplayError::MissingChainConfig(init.chain_id))?
                        .clone()
                }
            };
            self.backend.initialize_genesis(&init, &config).map_err(ReplayError::Execution)?
        } else {
            let prior = header_by_hash(self.oracle.as_ref(), last_block_hash).await?;
            let delayed = delayed_messages_read(&prior);
            self.backend
                .open_state(prior.state_root, StateMode::Deterministic)
                .map_err(ReplayError::Execution)?;

            let config = self.resolve_chain_config()?;
            let message = self.read_message(&config.arbitrum, delayed).await?;

            let context = ChainContext::new(self.oracle.clone());
            let fetcher = TapeBatchFetcher::new(self.oracle.clone());
            self.backend
                .produce_block(&prior, &message, &config, &context, &fetcher)
                .map_err(ReplayError::Execution)?
        };

        let block_hash = new_header.hash_slow();
        let extra = HeaderExtraInfo::decode(&new_header);
        info!(target: "replay", %block_hash, state_root = %new_header.state_root, "final state");
        if extra.arbos_format_version == 0 {
            return Err(ReplayError::ArbOsVersionZero(block_hash));
        }

        self.oracle.set_last_block_hash(block_hash).await;
        self.oracle.set_send_root(extra.send_root).await;
        Ok(ReplayOutcome { block_hash, send_root: extra.send_root })
    }

    /// Recovers the chain config out of system state, falling back to the
    /// compiled-in table when state carries none.
    fn resolve_chain_config(&mut self) -> Result<ChainConfig, ReplayError<E::Error>> {
        let state = self.backend.system_state().map_err(ReplayError::Execution)?;
        if state.chain_config_json.is_empty() {
            warn!(target: "replay", chain_id = state.chain_id, "no chain config in system state, falling back to the compiled-in table");
            return Ok(chain_config_by_id(state.chain_id)
                .ok_or(ReplayError::MissingChainConfig(state.chain_id))?
                .clone());
        }
        let config: ChainConfig = serde_json::from_slice(&state.chain_config_json)
            .map_err(ReplayError::ChainConfigParse)?;
        if config.chain_id != state.chain_id {
            return Err(ReplayError::ChainIdMismatch {
                state: state.chain_id,
                config: config.chain_id,
            });
        }
        if config.arbitrum.genesis_block_num != state.genesis_block_num {
            return Err(ReplayError::GenesisMismatch {
                state: state.genesis_block_num,
                config: config.arbitrum.genesis_block_num,
            });
        }
        Ok(config)
    }

    /// Builds the provider set out of the chain params and pops one message.
    async fn read_message(
        &self,
        params: &ArbitrumChainParams,
        delayed_messages_read: u64,
    ) -> Result<MessageWithMetadata, ReplayError<E::Error>> {
        if params.data_availability_committee && params.celestia_da {
            return Err(ReplayError::ConflictingDa);
        }

        let mut providers = Vec::new();
        if params.data_availability_committee {
            providers.push(DaProvider::Das(DasReader::new(self.oracle.clone())));
        }
        if params.celestia_da {
            providers.push(DaProvider::Celestia(CelestiaReader::new(self.oracle.clone())));
        }
        // The blob reader rides along regardless of the DA flags.
        providers.push(DaProvider::Blobs(BlobReader::new(self.oracle.clone())));

        let mut multiplexer = InboxMultiplexer::new(
            OracleInbox::new(self.oracle.clone()),
            delayed_messages_read,
            DaProviders::new(providers),
            KeysetValidationMode::PanicIfInvalid,
            self.oracle.clone(),
        );
        Ok(multiplexer.pop().await?)
    }
}

/// Warms the secp256k1 basepoint tables by recovering a fixed sample
/// signature. Failures are logged and ignored: this only exists so the
/// warm tables land in the cached early machine state shared by every
/// replay, and never affects outputs.
fn populate_ecdsa_cache() {
    use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};

    let Ok(raw) = hex::decode(SAMPLE_SIGNATURE) else {
        warn!(target: "replay", "failed to decode sample signature to populate ecdsa cache");
        return;
    };
    if raw.len() != 65 {
        warn!(target: "replay", len = raw.len(), "sample signature has unexpected length");
        return;
    }
    let (Ok(signature), Some(recovery_id)) =
        (Signature::from_slice(&raw[..64]), RecoveryId::from_byte(raw[64]))
    else {
        warn!(target: "replay", "failed to parse sample signature to populate ecdsa cache");
        return;
    };
    if let Err(err) = VerifyingKey::recover_from_prehash(&[0u8; 32], &signature, recovery_id) {
        warn!(target: "replay", %err, "failed to recover sample signature to populate ecdsa cache");
    }
}
