//! BER curves for several code lengths
//!
//! Longer Walsh codes average the per-chip noise over more chips, so at equal
//! chip noise the BER drops as the station count grows.

use burn_ndarray::NdArray;
use walshcdma::{check_orthogonality, run_ber_sweep, WalshMatrix};

type Backend = NdArray<f32>;

fn main() {
    let device = Default::default();
    let levels = [0.5, 1.0, 2.0, 4.0, 8.0];
    let trials = 400;
    let seed = 2024;

    println!("=== BER vs chip noise sigma ({} trials per point) ===", trials);
    print!("{:<10}", "Stations");
    for sigma in &levels {
        print!("{:>12}", format!("s={}", sigma));
    }
    println!();

    for order in [2, 4, 6] {
        let matrix = match WalshMatrix::<Backend>::from_order(&device, order) {
            Ok(m) => m,
            Err(e) => {
                eprintln!("order {}: {}", order, e);
                continue;
            }
        };

        match check_orthogonality(&matrix) {
            Ok(report) if report.all_orthogonal => {}
            Ok(report) => {
                eprintln!("order {}: max off-diagonal {}", order, report.max_off_diagonal);
                continue;
            }
            Err(e) => {
                eprintln!("order {}: {}", order, e);
                continue;
            }
        }

        match run_ber_sweep(&matrix, &levels, trials, seed) {
            Ok(report) => {
                print!("{:<10}", matrix.num_stations());
                for point in &report.points {
                    print!("{:>12.3e}", point.error_rate);
                }
                println!();
            }
            Err(e) => eprintln!("order {}: {}", order, e),
        }
    }
}
