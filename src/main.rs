use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use fips_dsa::{DsaEngine, DsaError, DsaKey, ParamGenOptions, SignInput, Signature, Standard};

type Result<T> = std::result::Result<T, DsaError>;

#[derive(Parser)]
#[command(name = "fips-dsa")]
#[command(about = "FIPS 186-2/186-4 DSA demonstration CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new domain-parameter set and key pair
    Generate {
        /// Bit length of p
        #[arg(short, long, default_value_t = 2048)]
        bits: u64,

        /// Use FIPS 186-4 (SHA-2) instead of the legacy 186-2 (SHA-1) regime
        #[arg(long)]
        fips_186_4: bool,

        /// Output file for the public key (hex-encoded p, q, g, pub_key, one per line)
        #[arg(long, default_value = "public_key.hex")]
        public_key: PathBuf,

        /// Output file for the private key (as above, plus priv_key on a final line)
        #[arg(long, default_value = "private_key.hex")]
        private_key: PathBuf,
    },

    /// Sign a message
    Sign {
        /// Path to the private key file
        #[arg(short = 'k', long)]
        private_key: PathBuf,

        /// Message to sign (if not provided, reads from stdin)
        #[arg(short, long)]
        message: Option<String>,

        /// Output file for the signature (hex-encoded r and s, if not provided, writes to stdout)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },

    /// Verify a signature
    Verify {
        /// Path to the public key file
        #[arg(short = 'k', long)]
        public_key: PathBuf,

        /// Path to the signature file
        #[arg(short = 's', long)]
        signature: PathBuf,

        /// Message to verify (if not provided, reads from stdin)
        #[arg(short, long)]
        message: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = match cli.command {
        Commands::Generate {
            bits,
            fips_186_4,
            public_key,
            private_key,
        } => generate_keypair(bits, fips_186_4, &public_key, &private_key),
        Commands::Sign {
            private_key,
            message,
            output,
        } => sign_message(&private_key, message.as_deref(), output.as_ref()),
        Commands::Verify {
            public_key,
            signature,
            message,
        } => verify_signature(&public_key, &signature, message.as_deref()),
    } {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn write_key(path: &PathBuf, key: &DsaKey) -> Result<()> {
    let mut lines = vec![
        hex::encode(key.p.to_bytes_be()),
        hex::encode(key.q.to_bytes_be()),
        hex::encode(key.g.to_bytes_be()),
        hex::encode(key.pub_key.to_bytes_be()),
    ];
    if let Some(priv_key) = &key.priv_key {
        lines.push(hex::encode(priv_key.to_bytes_be()));
    }
    fs::write(path, lines.join("\n"))
        .map_err(|e| DsaError::Internal(format!("writing key file: {e}")))
}

fn load_key(path: &PathBuf) -> Result<DsaKey> {
    let content = fs::read_to_string(path)
        .map_err(|e| DsaError::Usage(format!("reading key file: {e}")))?;
    let lines: Vec<&str> = content.lines().collect();
    if lines.len() < 4 {
        return Err(DsaError::Usage(
            "key file must contain at least p, q, g, pub_key".into(),
        ));
    }
    let decode = |s: &str| -> Result<fips_dsa::BigUint> {
        hex::decode(s)
            .map(|b| fips_dsa::BigUint::from_bytes_be(&b))
            .map_err(|e| DsaError::Usage(format!("invalid hex in key file: {e}")))
    };
    let p = decode(lines[0])?;
    let q = decode(lines[1])?;
    let g = decode(lines[2])?;
    let pub_key = decode(lines[3])?;
    let priv_key = match lines.get(4) {
        Some(s) => Some(decode(s)?),
        None => None,
    };
    let key = DsaKey::from_parts(p, q, g, pub_key, priv_key);
    key.validate()?;
    Ok(key)
}

fn read_message(message: Option<&str>) -> Result<Vec<u8>> {
    match message {
        Some(m) => Ok(m.as_bytes().to_vec()),
        None => {
            let mut buffer = Vec::new();
            io::stdin()
                .read_to_end(&mut buffer)
                .map_err(|e| DsaError::Usage(format!("reading stdin: {e}")))?;
            Ok(buffer)
        }
    }
}

fn generate_keypair(
    bits: u64,
    fips_186_4: bool,
    public_key_path: &PathBuf,
    private_key_path: &PathBuf,
) -> Result<()> {
    let standard = if fips_186_4 {
        Standard::Fips186_4
    } else {
        Standard::Fips186_2
    };
    println!("Generating a {bits}-bit key pair under {standard:?}...");

    let engine = DsaEngine::new(Some(standard));
    let opts = ParamGenOptions::new(bits).with_standard(standard);
    let key = engine.keygen(&opts)?;

    write_key(public_key_path, &key.public_only())?;
    println!("Public key saved to: {}", public_key_path.display());

    write_key(private_key_path, &key)?;
    println!("Private key saved to: {}", private_key_path.display());

    println!("Key pair generated successfully!");
    Ok(())
}

fn sign_message(private_key_path: &PathBuf, message: Option<&str>, output: Option<&PathBuf>) -> Result<()> {
    let key = load_key(private_key_path)?;
    let message_bytes = read_message(message)?;

    let engine = DsaEngine::new(None);
    let signature = engine.sign(&key, SignInput::Message(&message_bytes), None)?;
    let signature_hex = format!(
        "{}\n{}",
        hex::encode(signature.r.to_bytes_be()),
        hex::encode(signature.s.to_bytes_be())
    );

    match output {
        Some(path) => {
            fs::write(path, signature_hex)
                .map_err(|e| DsaError::Internal(format!("writing signature file: {e}")))?;
            println!("Signature saved to: {}", path.display());
        }
        None => println!("{}", signature_hex),
    }
    Ok(())
}

fn verify_signature(public_key_path: &PathBuf, signature_path: &PathBuf, message: Option<&str>) -> Result<()> {
    let key = load_key(public_key_path)?;
    let message_bytes = read_message(message)?;

    let signature_hex = fs::read_to_string(signature_path)
        .map_err(|e| DsaError::Usage(format!("reading signature file: {e}")))?;
    let lines: Vec<&str> = signature_hex.lines().collect();
    if lines.len() < 2 {
        return Err(DsaError::Usage(
            "signature file must contain r and s, one per line".into(),
        ));
    }
    let r = hex::decode(lines[0])
        .map(|b| fips_dsa::BigUint::from_bytes_be(&b))
        .map_err(|e| DsaError::Usage(format!("invalid hex for r: {e}")))?;
    let s = hex::decode(lines[1])
        .map(|b| fips_dsa::BigUint::from_bytes_be(&b))
        .map_err(|e| DsaError::Usage(format!("invalid hex for s: {e}")))?;
    let signature = Signature { r, s };

    let engine = DsaEngine::new(None);
    let is_valid = engine.verify(&key, &signature, SignInput::Message(&message_bytes), None)?;

    if is_valid {
        println!("✓ Signature is valid");
        Ok(())
    } else {
        println!("✗ Signature is invalid");
        std::process::exit(1);
    }
}
