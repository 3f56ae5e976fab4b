// Operator CLI for key handling, message inspection and local simulation

use clap::{Parser, Subcommand};
use home_bridge::bridge::{BridgeConfig, BridgeError, HomeBridge, SignatureStatus};
use home_bridge::consensus::TxHash;
use home_bridge::gateway::InMemoryToken;
use home_bridge::identity::{Address, AddressError, Keypair, KeypairError, SignatureError, Signer};
use home_bridge::limits::{LimitsConfig, ManualClock, UNIT};
use home_bridge::relay::{
    MessageError, MessageHash, MockRelayTarget, RelayError, Relayer, RelayerConfig, ReleaseMessage,
    TransferId,
};
use home_bridge::storage::{BridgeStore, StoreError};
use home_bridge::validators::{ValidatorSet, ValidatorSetError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Address(#[from] AddressError),
    #[error(transparent)]
    Keypair(#[from] KeypairError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error(transparent)]
    Message(#[from] MessageError),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
    #[error(transparent)]
    Validators(#[from] ValidatorSetError),
    #[error(transparent)]
    Relay(#[from] RelayError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("{0}")]
    Usage(String),
}

#[derive(Parser)]
#[command(name = "bridge")]
#[command(about = "Home bridge - validator consensus and release signing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a validator key
    Keygen {
        /// Store the key in this database under --label
        #[arg(long)]
        db: Option<PathBuf>,

        #[arg(long, default_value = "default")]
        label: String,
    },

    /// Print the address of a hex secret key
    Address {
        #[arg(long)]
        secret: String,
    },

    /// Build a release message and print it with its hash
    EncodeMessage {
        #[arg(long)]
        recipient: String,

        /// Amount in base units
        #[arg(long)]
        amount: u128,

        #[arg(long)]
        bridge_id: String,

        /// Transfer nonce used to derive the transfer id
        #[arg(long, default_value = "0")]
        nonce: u64,
    },

    /// Sign a hex-encoded message with a hex secret key
    Sign {
        #[arg(long)]
        secret: String,

        #[arg(long)]
        message: String,
    },

    /// Recover the signer of a hex-encoded message
    Recover {
        #[arg(long)]
        signature: String,

        #[arg(long)]
        message: String,
    },

    /// Run both bridge directions locally with in-memory collaborators
    Simulate {
        /// Number of validators
        #[arg(short = 'n', long, default_value = "3")]
        validators: usize,

        /// Threshold (M in M-of-N)
        #[arg(short = 't', long, default_value = "2")]
        threshold: u32,

        /// Amount per transfer, in whole tokens
        #[arg(long, default_value = "5")]
        amount: u128,

        /// Persist the resulting ledger snapshot here
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Summarize a persisted ledger snapshot
    Inspect {
        #[arg(long)]
        db: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let result = match cli.command {
        Commands::Keygen { db, label } => keygen(db, &label),
        Commands::Address { secret } => address(&secret),
        Commands::EncodeMessage {
            recipient,
            amount,
            bridge_id,
            nonce,
        } => encode_message(&recipient, amount, &bridge_id, nonce),
        Commands::Sign { secret, message } => sign(&secret, &message),
        Commands::Recover { signature, message } => recover(&signature, &message),
        Commands::Simulate {
            validators,
            threshold,
            amount,
            db,
        } => simulate(validators, threshold, amount, db).await,
        Commands::Inspect { db } => inspect(db),
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, CliError> {
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}

fn keygen(db: Option<PathBuf>, label: &str) -> Result<(), CliError> {
    let keypair = Keypair::generate();
    println!("address: {}", keypair.address());
    println!("secret:  0x{}", hex::encode(keypair.to_bytes()));

    if let Some(path) = db {
        let store = BridgeStore::open(&path)?;
        store.save_validator_key(label, &keypair)?;
        store.flush()?;
        println!("stored as '{}' in {}", label, path.display());
    }
    Ok(())
}

fn address(secret: &str) -> Result<(), CliError> {
    println!("{}", Keypair::from_hex(secret)?.address());
    Ok(())
}

fn encode_message(recipient: &str, amount: u128, bridge_id: &str, nonce: u64) -> Result<(), CliError> {
    let bridge_id = Address::parse(bridge_id)?;
    let message = ReleaseMessage::new(
        Address::parse(recipient)?,
        amount,
        TransferId::derive(&bridge_id, nonce),
        bridge_id,
    );
    println!("message: 0x{}", hex::encode(message.encode()));
    println!("hash:    {}", message.hash());
    Ok(())
}

fn sign(secret: &str, message: &str) -> Result<(), CliError> {
    let keypair = Keypair::from_hex(secret)?;
    let signature = Signer::sign(&keypair, &decode_hex(message)?);
    println!("0x{}", hex::encode(signature.as_bytes()));
    Ok(())
}

fn recover(signature: &str, message: &str) -> Result<(), CliError> {
    let signer = Signer::recover(&decode_hex(signature)?, &decode_hex(message)?)?;
    println!("{}", signer);
    Ok(())
}

async fn simulate(
    validator_count: usize,
    threshold: u32,
    amount: u128,
    db: Option<PathBuf>,
) -> Result<(), CliError> {
    let keys: Vec<Keypair> = (0..validator_count).map(|_| Keypair::generate()).collect();
    let registry = Arc::new(ValidatorSet::new(keys.iter().map(Keypair::address), threshold)?);

    let token_address = Keypair::generate().address();
    let token = Arc::new(InMemoryToken::new(token_address));
    let owner = Keypair::generate().address();
    let bridge_id = Keypair::generate().address();
    let clock = Arc::new(ManualClock::new(chrono::Utc::now().timestamp().max(0) as u64));

    let config = BridgeConfig::new()
        .with_validators(registry)
        .with_token(token.clone())
        .with_limits(LimitsConfig::default())
        .with_owner(owner)
        .with_bridge_id(bridge_id)
        .with_clock(clock);
    let bridge = HomeBridge::initialize(config)?;

    let amount = amount
        .checked_mul(UNIT)
        .ok_or_else(|| CliError::Usage("amount too large".to_string()))?;

    // Inbound: validators affirm a counterpart deposit until it finalizes
    let recipient = Keypair::generate().address();
    let external_tx_id = TxHash::from_bytes(rand::random());
    for key in &keys {
        let status = bridge.affirm(&key.address(), recipient, amount, external_tx_id)?;
        info!(validator = %key.address(), ?status, "affirmation submitted");
        if !matches!(status, home_bridge::AffirmationStatus::Pending { .. }) {
            break;
        }
    }
    println!("recipient {} balance: {}", recipient, token.balance_of(&recipient));

    // Outbound: a deposit becomes a release message validators sign
    let depositor = Keypair::generate().address();
    let message = bridge.on_inbound_notification(&token_address, depositor, amount, &[])?;
    let raw = message.encode();
    let mut collected: Option<MessageHash> = None;
    for key in &keys {
        let signature = Signer::sign(key, &raw);
        let status = bridge.submit_signature(&key.address(), signature.as_bytes(), &raw)?;
        if let SignatureStatus::Collected { responsible } = status {
            info!(%responsible, "signatures collected");
            collected = Some(message.hash());
            break;
        }
    }

    let hash = collected.ok_or_else(|| CliError::Usage("threshold not reached".to_string()))?;
    let bundle = bridge
        .relay_bundle(&hash)
        .ok_or_else(|| CliError::Usage("no relay bundle".to_string()))?;
    println!("bundle: {}", bundle.encode_base64());

    let mut relayer = Relayer::new(
        RelayerConfig::new().with_retry_delay_ms(10),
        Box::new(MockRelayTarget::new().with_failures_then_success(1)),
    )?;
    relayer.submit(bundle)?;
    let result = relayer.process(&hash).await?;
    println!(
        "relay: success={} attempts={} tx={}",
        result.is_success(),
        result.attempts(),
        result.transaction_id().unwrap_or("-")
    );

    for event in bridge.take_events() {
        println!("event: {:?}", event);
    }

    if let Some(path) = db {
        let store = BridgeStore::open(&path)?;
        store.save_snapshot(&bridge.snapshot())?;
        store.flush()?;
        println!("snapshot saved to {}", path.display());
    }
    Ok(())
}

fn inspect(db: PathBuf) -> Result<(), CliError> {
    let store = BridgeStore::open(&db)?;
    let snapshot = store
        .load_snapshot()?
        .ok_or_else(|| CliError::Usage(format!("no snapshot in {}", db.display())))?;

    println!("bridge id:         {}", snapshot.bridge_id);
    println!("owner:             {}", snapshot.owner);
    println!("gas price:         {}", snapshot.gas_price);
    println!("confirmations:     {}", snapshot.required_block_confirmations);
    println!(
        "forwarding:        {}",
        snapshot
            .forwarding
            .map(|addr| addr.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("claims:            {}", snapshot.consensus.claim_count());
    println!("release messages:  {}", snapshot.requests.message_count());
    println!("transfers raised:  {}", snapshot.requests.nonce());
    println!("out of limit:      {}", snapshot.limiter.out_of_limit_amount());
    println!("limits:            {:?}", snapshot.limiter.config());

    let stats = store.stats()?;
    println!("keys on disk:      {} ({} bytes)", stats.key_count, stats.disk_size_bytes);
    for label in store.list_validator_keys()? {
        println!("validator key:     {}", label);
    }
    Ok(())
}
