use std::process::ExitCode;
use std::time::Instant;

use linefit::prelude::*;
use linefit::redshift::{H_ALPHA, NII_6583};
use linefit::synthetic::halpha_nii;

fn main() -> ExitCode {
    pretty_env_logger::init();

    let (truth, spectrum) = halpha_nii(0.0035, 0.5, 20241019);
    println!(
        "Synthesized {} points between {:?} from {}",
        spectrum.len(),
        spectrum.wavelength_range(),
        truth
    );

    let model = DoubletModel::default();
    let initial = model.guess(&spectrum);
    println!("Initial guess {}", initial);

    let mut fitter = DoubletFitter::new(spectrum.borrow(), model);
    let start = Instant::now();
    let fit = match fitter.fit(initial) {
        Ok(fit) => fit.clone(),
        Err(err) => {
            println!("Encountered error {}", err);
            return ExitCode::FAILURE;
        }
    };
    println!("Fitting took microseconds {}", (Instant::now() - start).as_micros());

    println!("{}", FitReport::new(&fit));

    let [(z1, z1_err), (z2, z2_err)] = fit.redshifts(H_ALPHA, NII_6583);
    println!(
        "Halpha redshift: {z1:.6} +/- {z1_err:.6} ({:.1} km/s)",
        velocity(z1)
    );
    println!(
        "[NII] redshift: {z2:.6} +/- {z2_err:.6} ({:.1} km/s)",
        velocity(z2)
    );

    #[cfg(feature = "plot")]
    {
        let path = "doublet_fit.svg";
        match linefit::plot::draw_fit_svg_file(&spectrum, &fit, path) {
            Ok(()) => println!("Wrote {path}"),
            Err(err) => {
                println!("Failed to draw {path}: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}
