use clap::{Parser, Subcommand};
use qh_calc::{
    CalcConfig, CurveRequest, GmfGenerator, GmmSet, HAZUS_DURATION_YEARS, HAZUS_RETURN_PERIODS,
    HazusLevels, ImtCurve, compute_hazard_curves_with_progress, compute_hazard_map, disaggregate,
    hazus_curves, iml_spectrum,
};
use qh_core::CalcProgress;
use qh_model::{Forecast, Site};
use qh_project::{Scenario, parse_imt};
use qh_results::{
    CurveRecord, DisaggRecord, ENGINE_VERSION, GmfRecord, HazusRecord, HazusRowRecord, MapPoint,
    MapRecord, ResultKind, ResultStore, RunManifest, SpectrumRecord, compute_run_id,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Project(#[from] qh_project::ProjectError),

    #[error(transparent)]
    Calc(#[from] qh_calc::CalcError),

    #[error(transparent)]
    Results(#[from] qh_results::ResultsError),

    #[error(transparent)]
    Validation(#[from] qh_project::ValidationError),

    #[error("{what}")]
    Usage { what: String },

    #[error("calculation thread panicked")]
    Worker,
}

type CliResult<T> = Result<T, CliError>;

fn usage(what: impl Into<String>) -> CliError {
    CliError::Usage { what: what.into() }
}

#[derive(Parser)]
#[command(name = "qh-cli")]
#[command(about = "QuakeFlow CLI - probabilistic seismic hazard calculations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario file syntax and structure
    Validate {
        /// Path to the scenario YAML or JSON file
        scenario_path: PathBuf,
    },
    /// Hazard curves for every intensity measure with levels
    Curve {
        scenario_path: PathBuf,
        /// Only this site (by name)
        #[arg(long)]
        site: Option<String>,
        /// Directory to store results in
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Hazard map: intensity at a probability for every site
    Map {
        scenario_path: PathBuf,
        /// Intensity measure, e.g. PGA or SA(1.0)
        #[arg(long, default_value = "PGA")]
        imt: String,
        /// Probability of exceedance within the time span
        #[arg(long, default_value_t = 0.1)]
        poe: f64,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Uniform-hazard spectrum from the scenario's SA levels
    Spectrum {
        scenario_path: PathBuf,
        #[arg(long, default_value_t = 0.1)]
        poe: f64,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Hazus PGA, PGV, SA(0.3) and SA(1.0) table over standard return periods
    Hazus {
        scenario_path: PathBuf,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Ground-motion fields for the scenario rupture
    Gmf {
        scenario_path: PathBuf,
        /// Overrides the scenario's realization count
        #[arg(long)]
        realizations: Option<usize>,
        /// Overrides the scenario's seed
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Disaggregate hazard by magnitude, distance and epsilon
    Disagg {
        scenario_path: PathBuf,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored runs for a scenario
    Runs {
        scenario_path: PathBuf,
        /// Results directory
        #[arg(long)]
        out: PathBuf,
    },
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { scenario_path } => cmd_validate(&scenario_path),
        Commands::Curve {
            scenario_path,
            site,
            out,
        } => cmd_curve(&scenario_path, site.as_deref(), out.as_deref()),
        Commands::Map {
            scenario_path,
            imt,
            poe,
            out,
        } => cmd_map(&scenario_path, &imt, poe, out.as_deref()),
        Commands::Spectrum {
            scenario_path,
            poe,
            site,
            out,
        } => cmd_spectrum(&scenario_path, poe, site.as_deref(), out.as_deref()),
        Commands::Hazus {
            scenario_path,
            site,
            out,
        } => cmd_hazus(&scenario_path, site.as_deref(), out.as_deref()),
        Commands::Gmf {
            scenario_path,
            realizations,
            seed,
            out,
        } => cmd_gmf(&scenario_path, realizations, seed, out.as_deref()),
        Commands::Disagg {
            scenario_path,
            site,
            out,
        } => cmd_disagg(&scenario_path, site.as_deref(), out.as_deref()),
        Commands::Runs { scenario_path, out } => cmd_runs(&scenario_path, &out),
    }
}

/// Everything a calculation command needs from a scenario file.
struct Loaded {
    scenario: Scenario,
    sites: Vec<Site>,
    labels: Vec<String>,
    forecast: Forecast,
    gmms: GmmSet,
    config: CalcConfig,
}

impl Loaded {
    fn from_path(path: &Path) -> CliResult<Self> {
        let scenario = qh_project::load(path)?;
        let sites = qh_project::build_sites(&scenario.sites)?;
        let labels = qh_project::site_labels(&scenario.sites);
        let forecast = qh_project::build_forecast(&scenario)?;
        let gmms = qh_project::build_gmm(&scenario.gmm)?;
        let config = qh_project::build_calc_config(&scenario)?;
        info!(
            scenario = %scenario.name,
            sites = sites.len(),
            sources = scenario.sources.len(),
            "scenario loaded"
        );
        Ok(Self {
            scenario,
            sites,
            labels,
            forecast,
            gmms,
            config,
        })
    }

    /// Site indices matching `filter`, or all sites.
    fn selected(&self, filter: Option<&str>) -> CliResult<Vec<usize>> {
        match filter {
            None => Ok((0..self.sites.len()).collect()),
            Some(name) => self
                .labels
                .iter()
                .position(|l| l == name)
                .map(|i| vec![i])
                .ok_or_else(|| usage(format!("no site named '{name}'"))),
        }
    }
}

fn persist<T: serde::Serialize + ?Sized>(
    out: Option<&Path>,
    scenario: &Scenario,
    kind: ResultKind,
    payload: &T,
) -> CliResult<()> {
    let Some(dir) = out else {
        return Ok(());
    };
    let store = ResultStore::new(dir.to_path_buf())?;
    let run_id = compute_run_id(scenario, &kind, ENGINE_VERSION);
    let manifest = RunManifest::new(run_id.clone(), scenario.name.clone(), kind, ENGINE_VERSION);
    let run_dir = store.save_run(&manifest, payload)?;
    println!("✓ Saved run {} to {}", run_id, run_dir.display());
    Ok(())
}

fn cmd_validate(scenario_path: &Path) -> CliResult<()> {
    println!("Validating scenario: {}", scenario_path.display());
    let loaded = Loaded::from_path(scenario_path)?;
    println!("✓ Scenario is valid");
    println!("  Sites: {}", loaded.sites.len());
    println!(
        "  Sources: {} ({} ruptures)",
        loaded.scenario.sources.len(),
        qh_model::ForecastModel::total_ruptures(&loaded.forecast)
    );
    println!("  Intensity measures: {}", loaded.scenario.levels.len());
    Ok(())
}

fn curve_requests(loaded: &Loaded) -> CliResult<Vec<CurveRequest>> {
    let requests = qh_project::build_curve_requests(&loaded.scenario)?;
    if requests.is_empty() {
        return Err(usage("scenario lists no intensity levels"));
    }
    Ok(requests)
}

/// Run the multi-IMT engine for one site on a worker thread while the
/// main thread renders progress.
fn curves_with_progress(
    loaded: &Loaded,
    site_index: usize,
    requests: &[CurveRequest],
) -> CliResult<Vec<ImtCurve>> {
    let progress = CalcProgress::new();
    let site = &loaded.sites[site_index];
    let label = &loaded.labels[site_index];
    let started = Instant::now();

    let result = std::thread::scope(|scope| {
        let handle = scope.spawn(|| {
            compute_hazard_curves_with_progress(
                site,
                &loaded.gmms,
                &loaded.forecast,
                requests,
                &loaded.config,
                &progress,
            )
        });
        while !handle.is_finished() {
            render_progress(label, &progress, started);
            std::thread::sleep(Duration::from_millis(100));
        }
        handle.join()
    });
    clear_progress_line();
    let curves = result.map_err(|_| CliError::Worker)??;
    Ok(curves)
}

fn clear_progress_line() {
    print!("\r{}\r", " ".repeat(100));
    let _ = io::stdout().flush();
}

fn render_progress(label: &str, progress: &CalcProgress, started: Instant) {
    let width = 28usize;
    let fraction = progress.fraction_complete();
    let filled = ((fraction * width as f64).round() as usize).min(width);
    print!(
        "\r[{}{}] {:>6.2}%  site={}  ruptures={}/{}  elapsed={:.1}s",
        "#".repeat(filled),
        "-".repeat(width - filled),
        fraction * 100.0,
        label,
        progress.current_rupture(),
        progress.total_ruptures(),
        started.elapsed().as_secs_f64()
    );
    let _ = io::stdout().flush();
}

fn cmd_curve(scenario_path: &Path, site: Option<&str>, out: Option<&Path>) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let requests = curve_requests(&loaded)?;
    let mut records = Vec::new();

    for i in loaded.selected(site)? {
        let curves = curves_with_progress(&loaded, i, &requests)?;
        let location = loaded.sites[i].location();
        println!("Site {}:", loaded.labels[i]);
        for c in &curves {
            println!("  {}", c.imt);
            for (x, y) in c.curve.iter() {
                println!("    {:>10.5}  {:.4e}", x.exp(), y);
            }
            records.push(CurveRecord::from_ln_curve(
                loaded.labels[i].clone(),
                location.lat(),
                location.lon(),
                &c.imt,
                &c.curve,
            ));
        }
    }

    persist(out, &loaded.scenario, ResultKind::HazardCurves, &records)
}

fn cmd_map(scenario_path: &Path, imt: &str, poe: f64, out: Option<&Path>) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let imt = parse_imt(imt, "--imt")?;
    let levels = qh_project::levels_for(&loaded.scenario, &imt)?
        .ok_or_else(|| usage(format!("scenario lists no levels for {imt}")))?;

    let map = compute_hazard_map(
        &levels,
        &loaded.sites,
        &loaded.gmms,
        &loaded.forecast,
        &imt,
        &loaded.config,
    )?;
    let imls = map.iml_at_probability(poe)?;

    println!("{imt} at {poe} probability of exceedance:");
    let mut points = Vec::with_capacity(map.len());
    for ((site_curve, iml), label) in map.curves.iter().zip(imls).zip(&loaded.labels) {
        match iml {
            Some(v) => println!("  {label:<20} {v:.5}"),
            None => println!("  {label:<20} (off curve)"),
        }
        points.push(MapPoint {
            site: label.clone(),
            lat: site_curve.lat,
            lon: site_curve.lon,
            iml,
        });
    }

    let record = MapRecord {
        imt: imt.to_string(),
        poe,
        points,
    };
    let kind = ResultKind::HazardMap {
        imt: imt.to_string(),
        poe,
    };
    persist(out, &loaded.scenario, kind, &record)
}

fn cmd_spectrum(
    scenario_path: &Path,
    poe: f64,
    site: Option<&str>,
    out: Option<&Path>,
) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let requests = curve_requests(&loaded)?;
    let mut records = Vec::new();

    for i in loaded.selected(site)? {
        let curves = curves_with_progress(&loaded, i, &requests)?;
        let spectrum = iml_spectrum(&curves, poe)?;
        println!("Site {} (poe {poe}):", loaded.labels[i]);
        for (period, iml) in spectrum.iter() {
            println!("  T={period:<6} {iml:.5}");
        }
        records.push(SpectrumRecord::from_spectrum(
            loaded.labels[i].clone(),
            poe,
            &spectrum,
        ));
    }

    persist(out, &loaded.scenario, ResultKind::Spectrum { poe }, &records)
}

fn cmd_hazus(scenario_path: &Path, site: Option<&str>, out: Option<&Path>) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let levels = HazusLevels::usgs_defaults()?;
    let mut records = Vec::new();

    for i in loaded.selected(site)? {
        let curves = hazus_curves(
            &loaded.sites[i],
            &loaded.gmms,
            &loaded.forecast,
            &levels,
            &loaded.config,
        )?;
        let rows = curves.at_return_periods(&HAZUS_RETURN_PERIODS, HAZUS_DURATION_YEARS)?;
        println!("Site {}:", loaded.labels[i]);
        println!(
            "  {:>8} {:>10} {:>9} {:>9} {:>9} {:>9}",
            "RP (yr)", "poe", "PGA (g)", "PGV", "SA0.3", "SA1.0"
        );
        for row in &rows {
            println!(
                "  {:>8} {:>10.5} {:>9.4} {:>9.3} {:>9.4} {:>9.4}",
                row.return_period, row.probability, row.pga, row.pgv, row.sa_03, row.sa_10
            );
        }
        records.push(HazusRecord {
            site: loaded.labels[i].clone(),
            duration_years: HAZUS_DURATION_YEARS,
            rows: rows.iter().map(HazusRowRecord::from).collect(),
        });
    }

    persist(out, &loaded.scenario, ResultKind::Hazus, &records)
}

fn cmd_gmf(
    scenario_path: &Path,
    realizations: Option<usize>,
    seed: Option<u64>,
    out: Option<&Path>,
) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let gmf = loaded
        .scenario
        .gmf
        .as_ref()
        .ok_or_else(|| usage("scenario has no gmf section"))?;
    let (imt, rupture, options) = qh_project::build_gmf(gmf)?;
    let count = realizations.unwrap_or(gmf.realizations);
    let seed = seed.unwrap_or(gmf.seed);
    if count == 0 {
        return Err(usage("realization count must be positive"));
    }

    let gmm = loaded.gmms.for_region(rupture.tectonic_region())?;
    let generator = GmfGenerator::new(&rupture, &loaded.sites, gmm, imt, &options)?;
    let fields = generator.sample_many(count, seed);
    let median = generator.mean_field();

    println!("{imt} fields: {count} realizations, seed {seed}");
    println!("  {:<20} {:>10} {:>10} {:>10}", "site", "median", "min", "max");
    for (s, label) in loaded.labels.iter().enumerate() {
        let (lo, hi) = fields
            .iter()
            .map(|f| f.values[s])
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        println!(
            "  {:<20} {:>10.5} {:>10.5} {:>10.5}",
            label, median.values[s], lo, hi
        );
    }

    let record = GmfRecord::from_fields(loaded.labels.clone(), seed, &imt, &fields);
    let kind = ResultKind::Gmf {
        imt: imt.to_string(),
        realizations: count,
        seed,
    };
    persist(out, &loaded.scenario, kind, &record)
}

fn cmd_disagg(scenario_path: &Path, site: Option<&str>, out: Option<&Path>) -> CliResult<()> {
    let loaded = Loaded::from_path(scenario_path)?;
    let disagg = loaded
        .scenario
        .disagg
        .as_ref()
        .ok_or_else(|| usage("scenario has no disagg section"))?;
    let imt = parse_imt(&disagg.imt, "disagg imt")?;
    let bins = qh_project::build_bin_axes(&disagg.bins)?;
    let target = qh_project::build_disagg_target(&loaded.scenario, disagg)?;
    let mut records = Vec::new();

    for i in loaded.selected(site)? {
        let result = disaggregate(
            &loaded.sites[i],
            &target,
            &loaded.forecast,
            &loaded.gmms,
            &imt,
            &bins,
            &loaded.config,
        )?;
        println!("Site {} ({imt} = {:.5}):", loaded.labels[i], result.iml);
        println!("  Total probability:   {:.4e}", result.total_probability);
        println!(
            "  Outside bins:        {:.4e}",
            result.out_of_bounds_probability
        );
        if let (Some(m), Some(r), Some(e)) = (
            result.mean_magnitude,
            result.mean_distance,
            result.mean_epsilon,
        ) {
            println!("  Mean M / R / eps:    {m:.2} / {r:.1} km / {e:.2}");
        }
        if let Some(mode) = &result.mode {
            println!(
                "  Modal bin:           M {:.2}, R {:.1} km, eps {:.2} ({:.1}%)",
                mode.centers[2],
                mode.centers[3],
                mode.centers[4],
                100.0 * mode.probability / result.total_probability
            );
        }
        for source in result.sources.iter().take(5) {
            println!(
                "    {:<24} {:>6.1}%",
                source.name,
                100.0 * source.fraction
            );
        }
        records.push(DisaggRecord::from_result(loaded.labels[i].clone(), &result));
    }

    let kind = ResultKind::Disagg {
        imt: imt.to_string(),
    };
    persist(out, &loaded.scenario, kind, &records)
}

fn cmd_runs(scenario_path: &Path, out: &Path) -> CliResult<()> {
    let scenario = qh_project::load(scenario_path)?;
    let store = ResultStore::new(out.to_path_buf())?;
    let runs = store.list_runs(&scenario.name)?;

    if runs.is_empty() {
        println!("No stored runs for scenario: {}", scenario.name);
    } else {
        println!("Stored runs for scenario '{}':", scenario.name);
        for manifest in runs {
            println!(
                "  {} {:?} ({})",
                manifest.run_id, manifest.kind, manifest.timestamp
            );
        }
    }
    Ok(())
}
