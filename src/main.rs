use clap::Parser;
use std::env;
use std::process::ExitCode;

use sd3vault::logger::{self, LoggerConfig};
use sd3vault::{
    ArchiveOptions, Config, GenerationRequest, KeyStyle, UploadResult, VaultClient, VaultError,
    DEFAULT_REGION,
};

/// Generate an image with Stable Diffusion 3.5 Large on Replicate and
/// archive it to S3 with the generation parameters embedded in the PNG.
#[derive(Parser, Debug)]
#[command(name = "sd3vault", version)]
struct Args {
    /// Text prompt for the image
    #[arg(long)]
    prompt: String,

    /// Target bucket; falls back to S3_BUCKET
    #[arg(long)]
    bucket: Option<String>,

    /// Exact object key; overrides --organized
    #[arg(long)]
    key: Option<String>,

    /// Store under images/YYYY/MM/DD/ instead of the bucket root
    #[arg(long)]
    organized: bool,

    /// Inference steps, recorded in the artifact metadata
    #[arg(long, default_value_t = 28)]
    steps: u32,

    /// Guidance scale (cfg)
    #[arg(long, default_value_t = 3.5)]
    guidance: f32,

    /// Seed for reproducible generation
    #[arg(long)]
    seed: Option<i64>,

    /// Image width in pixels
    #[arg(long, default_value_t = 1024)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// AWS region; falls back to AWS_DEFAULT_REGION, then AWS_REGION
    #[arg(long)]
    region: Option<String>,

    /// Print the public object URL in the summary. The object ACL is not
    /// touched; actual visibility is governed by the bucket policy.
    #[arg(long)]
    public: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logger::init_with_config(LoggerConfig::default()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let env_file = env::var("ENV_FILE").unwrap_or_else(|_| "secrets.env".to_string());
    match dotenv::from_filename(&env_file) {
        Ok(_) => log::info!("✅ Loaded environment from {}", env_file),
        Err(_) => log::warn!(
            "⚠️  No {} file found, using system environment variables",
            env_file
        ),
    }

    let args = Args::parse();

    tokio::select! {
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                log::error!("❌ {}", e);
                ExitCode::FAILURE
            }
        },
        _ = interrupt() => {
            log::warn!("⚠️  Interrupted");
            ExitCode::from(130)
        }
    }
}

async fn interrupt() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {}
        Err(e) => {
            log::warn!("Failed to install Ctrl+C handler: {}", e);
            // Wait indefinitely if the handler cannot be installed
            std::future::pending::<()>().await;
        }
    }
}

async fn run(args: Args) -> sd3vault::Result<()> {
    let mut config = Config::from_env();
    if let Some(region) = args.region.clone() {
        config.s3.region = Some(region);
    }

    let bucket = match args.bucket.clone().or_else(|| config.s3.bucket.clone()) {
        Some(bucket) => bucket,
        None => {
            return Err(VaultError::InvalidArgument(
                "no bucket given, pass --bucket or set S3_BUCKET".to_string(),
            ))
        }
    };

    log::info!("🪣 Using bucket: {}", bucket);
    if config.s3.region.is_none() {
        log::info!(
            "No region via args or env; will fall back to {} inside the S3 client",
            DEFAULT_REGION
        );
    }

    let client = VaultClient::new(config).await?;
    log::info!("✓ Replicate token found");

    let request = GenerationRequest {
        prompt: args.prompt,
        steps: args.steps,
        guidance: args.guidance,
        seed: args.seed,
        width: args.width,
        height: args.height,
        ..Default::default()
    };

    let options = ArchiveOptions {
        bucket,
        key_style: KeyStyle::from_flags(args.key, args.organized),
        public: args.public,
    };

    let result = client.generate_and_archive(&request, &options).await?;
    print_summary(&result);

    Ok(())
}

fn print_summary(result: &UploadResult) {
    println!();
    println!("{}", "=".repeat(60));
    println!("✅ IMAGE GENERATED AND UPLOADED SUCCESSFULLY");
    println!("{}", "=".repeat(60));
    println!("📁 S3 URI:      {}", result.s3_uri);
    println!("📄 Filename:    {}", result.filename);
    println!("📅 Generated:   {}", result.generated_at.to_rfc3339());

    if result.is_public {
        println!("🌐 Public URL:  {}", result.public_url);
        println!();
        println!("💡 You can share this URL directly!");
    } else {
        println!();
        println!("💡 Image is private. Use --public flag for public access.");
        println!("   Or configure the bucket policy for public reads.");
    }

    println!("{}", "=".repeat(60));
    println!();

    // Bare URI last, for script consumption
    println!("{}", result.s3_uri);
}
