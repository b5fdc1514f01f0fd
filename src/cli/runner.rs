use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use slopecube::api::{SYNTHETIC_GEOMETRY, run_inversion, synthetic_check};
use slopecube::{CropWindow, CubeShape, InversionParams};

use super::args::CliArgs;
use super::errors::AppError;

const SELF_TEST_TOLERANCE: f64 = 1e-6;

fn init_logging(enabled: bool) {
    if enabled || std::env::var_os("RUST_LOG").is_some() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        // a subscriber may already be installed when embedded or under test
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

fn required<T>(value: Option<T>, arg: &str) -> Result<T, AppError> {
    value.ok_or(AppError::MissingArgument {
        arg: arg.to_string(),
    })
}

fn params_from_args(args: CliArgs) -> Result<InversionParams, AppError> {
    if let Some(config) = args.config {
        info!("Loading inversion parameters from {:?}", config);
        return Ok(InversionParams::from_json_file(&config)?);
    }

    let crop = args.crop.as_deref().map(str::parse::<CropWindow>).transpose()?;
    let dims = match args.dims {
        Some(value) => Some(
            value
                .parse::<CubeShape>()
                .map_err(|reason| AppError::InvalidDims { value, reason })?,
        ),
        None => None,
    };

    Ok(InversionParams {
        range_cube: required(args.range_cube, "--range-cube")?,
        azimuth_cube: required(args.azimuth_cube, "--azimuth-cube")?,
        incidence: required(args.inc, "--inc")?,
        aspect: required(args.aspect, "--aspect")?,
        heading: required(args.heading, "--heading")?,
        dest: required(args.dest, "--dest")?,
        ext: required(args.ext, "--ext")?,
        crop,
        dims,
    })
}

fn run_self_test() -> Result<(), AppError> {
    let (heading, incidence, aspect) = SYNTHETIC_GEOMETRY;
    info!(
        "Running synthetic test: heading={} incidence={} aspect={}",
        heading, incidence, aspect
    );
    let report = synthetic_check()?;
    println!("u_az:\n{}", report.u_az);
    println!("u_rg:\n{}", report.u_rg);
    println!("u_slope:\n{}", report.u_slope);
    println!("u_z:\n{}", report.u_z);
    println!("max reprojection residual: {:e}", report.max_residual);
    if report.max_residual > SELF_TEST_TOLERANCE {
        return Err(AppError::SelfTestFailed {
            residual: report.max_residual,
            tolerance: SELF_TEST_TOLERANCE,
        });
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(args.log);

    if let Some(threads) = args.threads {
        if threads == 0 {
            return Err(AppError::ZeroThreads.into());
        }
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(AppError::from)?;
        info!("Using {} worker threads", threads);
    }

    if args.self_test {
        run_self_test()?;
        return Ok(());
    }

    let params = params_from_args(args)?;
    match run_inversion(&params) {
        Ok(report) => {
            info!(
                "Inverted cube {} ({} singular pixels, {} no-data cells)",
                report.shape, report.stats.singular_pixels, report.stats.nodata_cells
            );
            info!("Successfully wrote {:?}", report.slope_path);
            info!("Successfully wrote {:?}", report.vertical_path);
            Ok(())
        }
        Err(e) => {
            let err = AppError::from(e);
            error!("{}", err);
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::{LittleEndian as LE, WriteBytesExt};
    use clap::Parser;
    use ndarray::Array3;
    use slopecube::ErrorKind;
    use slopecube::io::cube;
    use std::fs::File;
    use std::path::Path;

    fn parse(flags: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("slopecube").chain(flags.iter().copied()))
            .unwrap()
    }

    const FULL: [&str; 14] = [
        "--range-cube", "rg", "--azimuth-cube", "az", "--inc", "inc.r4", "--aspect", "asp.r4",
        "--heading", "-80", "--dest", "out", "--ext", "desc",
    ];

    fn without(flag: &str) -> Vec<&'static str> {
        FULL.chunks(2)
            .filter(|pair| pair[0] != flag)
            .flatten()
            .copied()
            .collect()
    }

    fn write_band(path: &Path, n: usize, value: f32) {
        let mut f = File::create(path).unwrap();
        for _ in 0..n {
            f.write_f32::<LE>(value).unwrap();
        }
    }

    /// A 3x4x2 scene on disk; returns the config file path.
    fn write_scene(dir: &Path) -> std::path::PathBuf {
        let range = Array3::from_shape_fn((3, 4, 2), |(i, j, k)| (i + j + k) as f32);
        let azimuth = Array3::from_shape_fn((3, 4, 2), |(i, j, k)| i as f32 - (j * k) as f32);
        cube::save(&range, dir, "rg").unwrap();
        cube::save(&azimuth, dir, "az").unwrap();
        write_band(&dir.join("inc.r4"), 12, 32.0);
        write_band(&dir.join("asp.r4"), 12, 200.0);

        let params = InversionParams {
            range_cube: dir.join("rg"),
            azimuth_cube: dir.join("az"),
            incidence: dir.join("inc.r4"),
            aspect: dir.join("asp.r4"),
            heading: 100.0,
            dest: dir.join("out"),
            ext: "cfg".into(),
            ..Default::default()
        };
        let config = dir.join("params.json");
        std::fs::write(&config, serde_json::to_string_pretty(&params).unwrap()).unwrap();
        config
    }

    fn app_error(err: Box<dyn std::error::Error>) -> AppError {
        *err.downcast::<AppError>().unwrap()
    }

    #[test]
    fn flags_build_params() {
        let params = params_from_args(parse(&FULL)).unwrap();
        assert_eq!(params.heading, -80.0);
        assert_eq!(params.ext, "desc");
        assert_eq!(params.crop, None);

        let mut flags = FULL.to_vec();
        flags.extend(["--crop", "0,2,1,3", "--dims", "3,4,2"]);
        let params = params_from_args(parse(&flags)).unwrap();
        assert_eq!(params.crop, Some(CropWindow::new(0, 2, 1, 3)));
        assert_eq!(params.dims, Some(CubeShape::new(3, 4, 2)));
    }

    #[test]
    fn missing_flags_are_reported_by_name() {
        for flag in ["--heading", "--dest"] {
            let err = params_from_args(parse(&without(flag))).unwrap_err();
            assert!(
                matches!(&err, AppError::MissingArgument { arg } if arg == flag),
                "{}: {:?}",
                flag,
                err
            );
        }
    }

    #[test]
    fn malformed_crop_is_range_error() {
        let mut flags = FULL.to_vec();
        flags.extend(["--crop", "0,2,x,3"]);
        let err = params_from_args(parse(&flags)).unwrap_err();
        assert!(matches!(err, AppError::Run { kind: ErrorKind::Range, .. }));
    }

    #[test]
    fn malformed_dims_is_rejected() {
        let mut flags = FULL.to_vec();
        flags.extend(["--dims", "3,x,2"]);
        let err = params_from_args(parse(&flags)).unwrap_err();
        assert!(matches!(err, AppError::InvalidDims { ref value, .. } if value == "3,x,2"));
    }

    #[test]
    fn config_conflicts_with_run_flags() {
        let err = CliArgs::try_parse_from(["slopecube", "--config", "p.json", "--heading", "100"])
            .err()
            .unwrap();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn config_file_supplies_params() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_scene(dir.path());
        let params = params_from_args(parse(&["--config", config.to_str().unwrap()])).unwrap();
        assert_eq!(params, InversionParams::from_json_file(&config).unwrap());
        assert_eq!(params.ext, "cfg");
    }

    #[test]
    fn zero_threads_is_rejected() {
        let mut flags = FULL.to_vec();
        flags.extend(["--threads", "0"]);
        assert!(matches!(app_error(run(parse(&flags)).unwrap_err()), AppError::ZeroThreads));
    }

    #[test]
    fn self_test_passes() {
        run(parse(&["--self-test"])).unwrap();
    }

    #[test]
    fn run_from_config_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let config = write_scene(dir.path());
        run(parse(&["--config", config.to_str().unwrap()])).unwrap();

        let out = dir.path().join("out");
        for name in ["depl_cumule_uslope_cfg", "depl_cumule_uz_cfg"] {
            let shape = cube::read_header(&out.join(name)).unwrap();
            assert_eq!(shape, CubeShape::new(3, 4, 2));
            assert!(out.join(format!("{}.json", name)).is_file());
        }
    }

    #[test]
    fn out_of_range_crop_fails_with_range_kind() {
        let dir = tempfile::tempdir().unwrap();
        write_scene(dir.path());
        let d = |name: &str| dir.path().join(name).to_str().unwrap().to_string();
        let (rg, az, inc, asp, out) = (d("rg"), d("az"), d("inc.r4"), d("asp.r4"), d("out"));
        let flags: [&str; 16] = [
            "--range-cube", &rg, "--azimuth-cube", &az, "--inc", &inc, "--aspect", &asp,
            "--heading", "100", "--dest", &out, "--ext", "x", "--crop", "0,9,0,2",
        ];
        let err = app_error(run(parse(&flags)).unwrap_err());
        assert!(matches!(err, AppError::Run { kind: ErrorKind::Range, .. }));
        assert!(!Path::new(&out).exists());
    }
}
