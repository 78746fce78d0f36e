use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use walshcdma::*;

#[cfg(feature = "wgpu")]
type MyBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
type MyBackend = burn_ndarray::NdArray<f32>;

#[derive(Parser, Debug)]
#[command(name = "walshcdma", version, about = "CDMA multiplexing with Walsh codes")]
struct Args {
    /// Walsh order n: 2^n stations share the channel
    #[arg(long, default_value_t = 3)]
    order: u32,

    /// Data bits, one per station (e.g. 1,0,1,1,0,0,1,0). Random when omitted.
    #[arg(long, value_delimiter = ',')]
    bits: Option<Vec<u8>>,

    /// Station to report in detail (1-based)
    #[arg(long)]
    station: Option<usize>,

    /// Channel noise standard deviation for the transmission round
    #[arg(long, default_value_t = 0.1)]
    sigma: f32,

    /// Noise levels for the BER sweep (comma separated)
    #[arg(long, value_delimiter = ',')]
    levels: Option<Vec<f32>>,

    /// Trials per BER noise level
    #[arg(long, default_value_t = 200)]
    trials: usize,

    #[arg(long, env = "SEED", default_value_t = 42)]
    seed: u64,

    /// Print the full code matrix
    #[arg(long)]
    show_matrix: bool,

    /// Skip the BER sweep
    #[arg(long)]
    skip_sweep: bool,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> CdmaResult<()> {
    let defaults = SimulationConfig::default();
    let config = SimulationConfig {
        order: args.order,
        noise_sigma: args.sigma,
        sigma_levels: args.levels.clone().unwrap_or(defaults.sigma_levels),
        trials_per_level: args.trials,
        seed: args.seed,
    };
    config.validate()?;

    let device = Default::default();
    let matrix = WalshMatrix::<MyBackend>::from_order(&device, config.order)?;
    let n = matrix.num_stations();

    println!("=======================================================");
    println!("   WalshCDMA - Code Division Multiple Access");
    println!("=======================================================");
    println!();
    println!("  - Stations: {} (Walsh order {})", n, config.order);
    println!("  - Code length: {} chips", n);
    println!("  - Channel noise: sigma = {}", config.noise_sigma);
    println!();

    if args.show_matrix {
        println!("Walsh code matrix:");
        print!("{}", matrix);
        println!();
    }

    // Orthogonality
    let report = check_orthogonality(&matrix)?;
    println!("Orthogonality check:");
    let autos = report.auto_correlations();
    println!("  - Auto-correlation: {} for all {} stations", autos.first().copied().unwrap_or(0), n);
    println!("  - Max cross-correlation: {}", report.max_off_diagonal);
    if report.all_orthogonal {
        println!("  ✓ All codes orthogonal");
    } else {
        println!("  ✗ Construction defect detected");
    }
    println!();

    // One transmission round
    let mut channel = AwgnChannel::new(config.noise_sigma, config.seed)?;
    let round = match &args.bits {
        Some(bits) => run_round(&matrix, bits, &mut channel)?,
        None => {
            let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
            run_random_round(&matrix, &mut rng, &mut channel)?
        }
    };

    println!("Transmission round:");
    println!("  Data bits: {:?}", round.bits);
    let composite = round.composite.to_vec()?;
    let shown: Vec<String> = composite.iter().map(|c| format!("{:.2}", c)).collect();
    println!("  Channel signal: [{}]", shown.join(", "));
    println!();
    println!("  {:<10}{:<10}{:<10}{:<10}{:<10}", "Station", "Original", "Score", "Decoded", "Status");
    println!("  {}", "-".repeat(48));
    for (i, outcome) in round.outcomes.iter().enumerate() {
        let decoded = match outcome.received() {
            Some(bit) => bit.to_string(),
            None => "?".to_string(),
        };
        let status = if outcome.is_error() { "ERROR" } else { "OK" };
        println!(
            "  {:<10}{:<10}{:<10.3}{:<10}{:<10}",
            i + 1,
            outcome.sent,
            outcome.decoded.score,
            decoded,
            status
        );
    }
    println!("  {}", "-".repeat(48));
    println!(
        "  Bit errors: {}/{} (BER {:.2}%)",
        round.errors(),
        round.outcomes.len(),
        round.error_rate() * 100.0
    );
    println!();

    if let Some(number) = args.station {
        let outcome = round.station(number)?;
        println!("Selected station {}:", number);
        println!("  Original data bit: {}", outcome.sent);
        match outcome.decoded.bit() {
            Ok(bit) => println!("  Decoded data bit: {} (score {:.4})", bit, outcome.decoded.score),
            Err(e) => println!("  {}", e),
        }
        if outcome.is_error() {
            println!("  ✗ Decoding failed!");
        } else {
            println!("  ✓ Decoding successful!");
        }
        println!();
    }

    if !args.skip_sweep {
        println!(
            "BER sweep ({} trials x {} stations per level):",
            config.trials_per_level, n
        );
        let sweep = run_ber_sweep(&matrix, &config.sigma_levels, config.trials_per_level, config.seed)?;
        println!("  {:<10}{:<14}{:<12}", "Sigma", "Errors", "BER");
        for point in &sweep.points {
            println!(
                "  {:<10.3}{:<14}{:<12.3e}",
                point.sigma,
                format!("{}/{}", point.errors, point.bits),
                point.error_rate
            );
        }
        println!();
    }

    println!("=======================================================");
    Ok(())
}
