use std::{error::Error, fs, path::Path};

use clap::Parser;
use probecal_pipeline::{run_calibration, CalibrationInput, SessionConfig};

/// Batch ultrasound probe calibration over a recorded capture list.
#[derive(Debug, Parser)]
#[command(author, version, about = "Probe calibration from recorded captures")]
struct Args {
    /// Path to JSON file containing a CalibrationInput.
    #[arg(long)]
    input: String,

    /// Optional path to a JSON SessionConfig. Defaults are used if omitted.
    #[arg(long)]
    config: Option<String>,
}

fn load_json_file<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let data = fs::read_to_string(path)?;
    let value = serde_json::from_str(&data)?;
    Ok(value)
}

fn run_from_files(input_path: &str, config_path: Option<&str>) -> Result<String, Box<dyn Error>> {
    let input: CalibrationInput = load_json_file(Path::new(input_path))?;

    let config = if let Some(cfg_path) = config_path {
        load_json_file::<SessionConfig>(Path::new(cfg_path))?
    } else {
        SessionConfig::default()
    };

    let report = run_calibration(&input, &config)?;
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn try_main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let json = run_from_files(&args.input, args.config.as_deref())?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use probecal_core::{compose_homogeneous, image_point, Mat3, Pt2, Real, Vec3};
    use probecal_pipeline::{CalibrationReport, CaptureRecord};
    use tempfile::NamedTempFile;

    fn write_json<T: serde::Serialize>(value: &T, path: &Path) {
        serde_json::to_writer_pretty(fs::File::create(path).unwrap(), value).unwrap();
    }

    fn synthetic_input(n: usize) -> CalibrationInput {
        let angle: Real = 0.15;
        let (s, c) = angle.sin_cos();
        let rotation = Mat3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);
        let scale = 0.12;
        let offset = Vec3::new(8.0, -3.0, 120.0);

        let mut captures = Vec::with_capacity(n);
        for i in 0..n {
            let p = Pt2::new(20.0 + 40.0 * (i % 3) as Real, 15.0 + 45.0 * (i / 3) as Real);
            let q = rotation * (scale * image_point(&p)) + offset;
            let d = Vec3::new(0.1, 0.2 * (i as Real).sin(), 1.0).normalize();
            let u = Vec3::x().cross(&d).normalize();
            let v = d.cross(&u);
            let pose = compose_homogeneous(&Mat3::from_columns(&[u, v, d]), &(q - d));
            captures.push(CaptureRecord { point: p, pose });
        }
        CalibrationInput { captures }
    }

    #[test]
    fn helper_smoke_test() {
        let input = synthetic_input(9);
        let input_file = NamedTempFile::new().unwrap();
        write_json(&input, input_file.path());

        let json = run_from_files(input_file.path().to_str().unwrap(), None)
            .expect("cli helper should succeed");

        let report: CalibrationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(report.captures, 9);
        assert!(report.mean_error < 1e-6, "mean {}", report.mean_error);
    }

    #[test]
    fn config_file_overrides_gates() {
        let input = synthetic_input(6);
        let input_file = NamedTempFile::new().unwrap();
        let config_file = NamedTempFile::new().unwrap();
        write_json(&input, input_file.path());
        fs::write(config_file.path(), r#"{"publish_after": 6}"#).unwrap();

        let json = run_from_files(
            input_file.path().to_str().unwrap(),
            Some(config_file.path().to_str().unwrap()),
        )
        .unwrap();

        let report: CalibrationReport = serde_json::from_str(&json).unwrap();
        assert!(report.ready_to_publish);
    }

    #[test]
    fn missing_input_file_is_an_error() {
        assert!(run_from_files("/nonexistent/captures.json", None).is_err());
    }
}
