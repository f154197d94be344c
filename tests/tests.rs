use is_close::is_close;
use num_complex::Complex64;
use procrsr::config::RsrConfig;
use procrsr::process_track_file;
use procrsr::retrieval::binning::BinningPolicy;
use procrsr::retrieval::calibrate::calibrate;
use procrsr::retrieval::decompose::{FitResult, RiceDecomposer, StatisticalDecomposer};
use procrsr::retrieval::dispatch::{par_retrieve_track, retrieve_track};
use procrsr::retrieval::error::RetrievalError;
use procrsr::retrieval::frames::{segment, Window};
use procrsr::retrieval::invert::{
    BedInputs, BedInversion, CoefficientInverter, SpmInverter, SurfaceInversion,
};
use procrsr::retrieval::record::{aggregate, WindowResult};
use procrsr::retrieval::scaling::mode_scale;
use procrsr::utils::table::output_path;
use procrsr::utils::track::{Track, TrackError};
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// Linear decomposer stub: both parameters scale with the sample so the
/// calibration round-trip is exact.
struct StubDecomposer;

impl StatisticalDecomposer for StubDecomposer {
    fn decompose(
        &self,
        mags: &[f64],
        _binning: BinningPolicy,
    ) -> Result<FitResult, RetrievalError> {
        if !mags.iter().any(|&m| m > 0.0) {
            return Err(RetrievalError::DegenerateSample(
                "all magnitudes are zero".to_string(),
            ));
        }
        let a = mags.iter().sum::<f64>() / mags.len() as f64;
        Ok(FitResult {
            a,
            s: a / 3.0,
            crl: 1.0,
        })
    }
}

/// Stub decomposer whose runtime varies with the sample, shuffling the
/// completion order of parallel windows.
struct SlowDecomposer;

impl StatisticalDecomposer for SlowDecomposer {
    fn decompose(
        &self,
        mags: &[f64],
        binning: BinningPolicy,
    ) -> Result<FitResult, RetrievalError> {
        let sum: f64 = mags.iter().sum();
        std::thread::sleep(Duration::from_millis((sum * 100.0) as u64 % 23));
        StubDecomposer.decompose(mags, binning)
    }
}

struct StubInverter;

impl CoefficientInverter for StubInverter {
    fn surface(
        &self,
        psc: f64,
        psn: f64,
        _h0: f64,
        _wf: f64,
        _wb: f64,
    ) -> Result<SurfaceInversion, RetrievalError> {
        Ok(SurfaceInversion {
            rsc: psc - 10.0,
            rsn: psn - 10.0,
            n1: 1.78,
            sh: 0.01,
        })
    }

    fn bed(
        &self,
        inputs: &BedInputs,
        _wf: f64,
        _wb: f64,
    ) -> Result<BedInversion, RetrievalError> {
        Ok(BedInversion {
            rbc: inputs.pbc - 20.0,
            rbn: inputs.pbn - 20.0,
        })
    }
}

fn noisy_amplitude(i: usize) -> f64 {
    1.0 + 0.3 * ((i as f64) * 0.7).sin()
}

/// Synthetic track with gentle along-track amplitude variation and a
/// geometry the reference inverter accepts.
fn synthetic_track(len: usize) -> Track {
    let mut track = Track {
        lat: vec![],
        lon: vec![],
        roll: vec![],
        rng: vec![],
        thick: vec![],
        srf: vec![],
        bed: vec![],
    };
    for i in 0..len {
        track.lat.push(-78.0 + i as f64 * 1e-5);
        track.lon.push(165.0 + i as f64 * 2e-5);
        track.roll.push(0.01);
        track.rng.push(10.0);
        track.thick.push(100.0);
        track.srf.push(Complex64::new(noisy_amplitude(i), 0.0));
        track.bed.push(Complex64::new(0.5 * noisy_amplitude(i + 7), 0.0));
    }
    track
}

fn constant_track(len: usize, srf: f64, bed: f64) -> Track {
    let mut track = synthetic_track(len);
    track.srf = vec![Complex64::new(srf, 0.0); len];
    track.bed = vec![Complex64::new(bed, 0.0); len];
    track
}

fn track_file_contents(track: &Track) -> String {
    let mut out = String::new();
    for i in 0..track.len() {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{}\n",
            track.lat[i],
            track.lon[i],
            track.roll[i],
            track.rng[i],
            track.srf[i].re,
            track.srf[i].im,
            track.thick[i],
            track.bed[i].re,
            track.bed[i].im,
        ));
    }
    out
}

#[test]
fn segmenter_advances_by_stride_and_covers_track() {
    for (n, w, s) in [
        (2000, 1000, 250),
        (2000, 1000, 1000),
        (2100, 1000, 250),
        (5000, 500, 100),
        (1000, 1000, 333),
        (10, 8, 2),
    ] {
        let windows = segment(n, w, s).expect("segmentation failed");
        assert!(!windows.is_empty());
        for (i, window) in windows.iter().enumerate() {
            assert_eq!(window.start, i * s, "start offsets advance by stride");
            assert!(window.start < window.end && window.end <= n);
            assert!(window.len() <= w);
        }
        let last = windows.last().expect("no windows");
        assert_eq!(last.end, n, "track tail is covered");
    }
}

#[test]
fn segmenter_clips_final_window() {
    let windows = segment(2100, 1000, 250).expect("segmentation failed");
    let last = windows.last().expect("no windows");
    assert_eq!(*last, Window { start: 1250, end: 2100 });
    assert!(last.len() < 1000);
}

#[test]
fn segmenter_single_window_when_size_reaches_track_length() {
    for w in [1000, 1200] {
        let windows = segment(1000, w, 250).expect("segmentation failed");
        assert_eq!(windows, vec![Window { start: 0, end: 1000 }]);
    }
}

#[test]
fn segmenter_rejects_zero_parameters() {
    assert!(matches!(
        segment(1000, 0, 250),
        Err(RetrievalError::InvalidConfig(_))
    ));
    assert!(matches!(
        segment(1000, 100, 0),
        Err(RetrievalError::InvalidConfig(_))
    ));
    assert!(matches!(
        segment(0, 100, 50),
        Err(RetrievalError::InvalidConfig(_))
    ));
}

#[test]
fn scale_factor_is_strictly_positive() {
    let constant = vec![2.5; 500];
    assert!(mode_scale(&constant).expect("scaling failed") > 0.0);

    let varied: Vec<f64> = (0..500).map(noisy_amplitude).collect();
    assert!(mode_scale(&varied).expect("scaling failed") > 0.0);

    let mostly_zero: Vec<f64> = (0..500).map(|i| if i % 5 == 0 { 1.0 } else { 0.0 }).collect();
    assert!(mode_scale(&mostly_zero).expect("scaling failed") > 0.0);
}

#[test]
fn scale_factor_rejects_all_zero_sample() {
    assert!(matches!(
        mode_scale(&[0.0; 100]),
        Err(RetrievalError::DegenerateSample(_))
    ));
    assert!(matches!(
        mode_scale(&[]),
        Err(RetrievalError::DegenerateSample(_))
    ));
}

#[test]
fn calibration_compensates_scaling_exactly() {
    let mags: Vec<f64> = (0..1000).map(noisy_amplitude).collect();
    let gain = -30.0;

    let mut powers = vec![];
    for scale in [1.0, mode_scale(&mags).expect("scaling failed"), 0.25] {
        let scaled: Vec<f64> = mags.iter().map(|m| m * scale).collect();
        let fit = StubDecomposer
            .decompose(&scaled, BinningPolicy::FreedmanDiaconis)
            .expect("fit failed");
        powers.push(calibrate(&fit, scale, gain).expect("calibration failed"));
    }
    for power in &powers[1..] {
        assert!(is_close!(power.coherent, powers[0].coherent, abs_tol = 1e-9));
        assert!(is_close!(power.incoherent, powers[0].incoherent, abs_tol = 1e-9));
    }
}

#[test]
fn calibration_round_trips_through_the_rice_fit() {
    let mags: Vec<f64> = (0..2000).map(noisy_amplitude).collect();

    let mut powers = vec![];
    for scale in [0.25, 1.0] {
        let scaled: Vec<f64> = mags.iter().map(|m| m * scale).collect();
        let fit = RiceDecomposer
            .decompose(&scaled, BinningPolicy::FreedmanDiaconis)
            .expect("fit failed");
        powers.push(calibrate(&fit, scale, -30.0).expect("calibration failed"));
    }
    assert!(is_close!(powers[0].coherent, powers[1].coherent, abs_tol = 1e-2));
    assert!(is_close!(powers[0].incoherent, powers[1].incoherent, abs_tol = 1e-2));
}

#[test]
fn calibration_rejects_nonpositive_fit_parameters() {
    for (a, s) in [(0.0, 0.1), (0.5, 0.0), (-0.5, 0.1), (0.5, -0.1)] {
        let fit = FitResult { a, s, crl: 1.0 };
        assert!(matches!(
            calibrate(&fit, 0.1, -30.0),
            Err(RetrievalError::NumericDomain(_))
        ));
    }
}

fn result_with_center(xo: usize) -> WindowResult {
    WindowResult {
        xo,
        xa: xo.saturating_sub(10),
        xb: xo + 10,
        lon: 0.0,
        lat: 0.0,
        roll: 0.0,
        psc: 0.0,
        psn: 0.0,
        pbc: 0.0,
        pbn: 0.0,
        rsc: 0.0,
        rsn: 0.0,
        rbc: 0.0,
        rbn: 0.0,
        crls: 1.0,
        crlb: 1.0,
        e1: 3.15,
        sh: 0.0,
        h0: 10.0,
        h1: 100.0,
        q1: -2.0,
    }
}

#[test]
fn aggregator_sorts_by_center_index() {
    let shuffled: Vec<WindowResult> = [499, 124, 999, 249, 749, 374]
        .into_iter()
        .map(result_with_center)
        .collect();
    let ordered = aggregate(shuffled);
    let centers: Vec<usize> = ordered.iter().map(|r| r.xo).collect();
    assert_eq!(centers, vec![124, 249, 374, 499, 749, 999]);
}

#[test]
fn dispatch_order_is_invariant_under_completion_latency() {
    let track = synthetic_track(4000);
    let cfg = RsrConfig {
        window_size: 500,
        stride: 500,
        workers: 4,
        ..RsrConfig::default()
    };
    let results = par_retrieve_track(&track, &cfg, &SlowDecomposer, &StubInverter)
        .expect("retrieval failed");

    let expected: Vec<usize> = segment(track.len(), cfg.window_size, cfg.stride)
        .expect("segmentation failed")
        .iter()
        .map(Window::center)
        .collect();
    let centers: Vec<usize> = results.iter().map(|r| r.xo).collect();
    assert_eq!(centers, expected);
}

#[test]
fn parallel_and_serial_retrieval_agree() {
    let track = synthetic_track(3000);
    let cfg = RsrConfig {
        window_size: 1000,
        stride: 500,
        workers: 4,
        ..RsrConfig::default()
    };
    let serial =
        retrieve_track(&track, &cfg, &StubDecomposer, &StubInverter).expect("retrieval failed");
    let parallel = par_retrieve_track(&track, &cfg, &StubDecomposer, &StubInverter)
        .expect("retrieval failed");

    assert_eq!(serial.len(), parallel.len());
    for (a, b) in serial.iter().zip(parallel.iter()) {
        assert_eq!(a.xo, b.xo);
        assert!(is_close!(a.psc, b.psc));
        assert!(is_close!(a.rbc, b.rbc));
    }
}

#[test]
fn two_window_constant_track_yields_equal_coherent_power() {
    let track = constant_track(2000, 1.0, 0.5);
    let cfg = RsrConfig {
        window_size: 1000,
        stride: 1000,
        workers: 4,
        ..RsrConfig::default()
    };
    let results = par_retrieve_track(&track, &cfg, &RiceDecomposer, &StubInverter)
        .expect("retrieval failed");

    assert_eq!(results.len(), 2);
    assert_eq!((results[0].xa, results[0].xb), (0, 999));
    assert_eq!((results[1].xa, results[1].xb), (1000, 1999));
    assert_eq!((results[0].xo, results[1].xo), (499, 1499));
    // Identical input statistics in both windows
    assert!(is_close!(results[0].psc, results[1].psc, abs_tol = 1e-9));
    assert!(is_close!(results[0].psc, -30.0, abs_tol = 1e-6));
}

#[test]
fn all_zero_bed_window_fails_the_batch() {
    let mut track = constant_track(2000, 1.0, 0.4);
    for i in 1000..2000 {
        track.bed[i] = Complex64::new(0.0, 0.0);
    }
    let cfg = RsrConfig {
        window_size: 1000,
        stride: 1000,
        workers: 4,
        ..RsrConfig::default()
    };
    let error = par_retrieve_track(&track, &cfg, &RiceDecomposer, &StubInverter)
        .expect_err("batch should fail");

    match error {
        RetrievalError::Window {
            center,
            start,
            end,
            source,
        } => {
            assert_eq!((center, start, end), (1499, 1000, 2000));
            assert!(matches!(*source, RetrievalError::DegenerateSample(_)));
        }
        other => panic!("expected a window error, got {other}"),
    }
}

#[test]
fn invalid_configuration_fails_before_processing() {
    let track = synthetic_track(100);
    for cfg in [
        RsrConfig { window_size: 0, ..RsrConfig::default() },
        RsrConfig { stride: 0, ..RsrConfig::default() },
        RsrConfig { workers: 0, ..RsrConfig::default() },
    ] {
        assert!(matches!(
            par_retrieve_track(&track, &cfg, &StubDecomposer, &StubInverter),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }
}

#[test]
fn surface_inversion_recovers_medium_parameters() {
    let inversion = SpmInverter
        .surface(-30.0, -45.0, 10.0, 195e6, 9.5e6)
        .expect("inversion failed");
    assert!(inversion.rsc < 0.0);
    assert!(inversion.n1 > 1.0 && inversion.n1.is_finite());
    assert!(inversion.sh > 0.0 && inversion.sh.is_finite());

    let bed = SpmInverter
        .bed(
            &BedInputs {
                psc: -30.0,
                psn: -45.0,
                pbc: -40.0,
                pbn: -50.0,
                n1: inversion.n1,
                sh: inversion.sh,
                h0: 10.0,
                h1: 100.0,
                q1: -2.0,
            },
            195e6,
            9.5e6,
        )
        .expect("bed inversion failed");
    assert!(bed.rbc.is_finite() && bed.rbn.is_finite());
}

#[test]
fn surface_inversion_rejects_reflection_above_unity() {
    let result = SpmInverter.surface(20.0, 10.0, 1000.0, 195e6, 9.5e6);
    assert!(matches!(result, Err(RetrievalError::Inversion(_))));
}

#[test]
fn surface_inversion_rejects_nonpositive_range() {
    let result = SpmInverter.surface(-30.0, -45.0, 0.0, 195e6, 9.5e6);
    assert!(matches!(result, Err(RetrievalError::Inversion(_))));
}

#[test]
fn track_ingestion_validates_the_schema() {
    let good = "1.0,2.0,0.1,10.0,0.5,0.5,100.0,0.2,0.1\n";
    let track = Track::from_reader(Cursor::new(good)).expect("ingestion failed");
    assert_eq!(track.len(), 1);
    assert!(is_close!(track.srf[0].re, 0.5));
    assert!(is_close!(track.bed[0].im, 0.1));

    let short = "1.0,2.0,0.1,10.0,0.5,0.5,100.0,0.2\n";
    assert!(matches!(
        Track::from_reader(Cursor::new(short)),
        Err(TrackError::Schema { line: 1, found: 8 })
    ));

    let garbled = "1.0,2.0,0.1,10.0,0.5,oops,100.0,0.2,0.1\n";
    assert!(matches!(
        Track::from_reader(Cursor::new(garbled)),
        Err(TrackError::Parse { line: 1, field: "srfq", .. })
    ));

    assert!(matches!(
        Track::from_reader(Cursor::new("")),
        Err(TrackError::Empty)
    ));
}

#[test]
fn output_path_appends_suffix_deterministically() {
    assert_eq!(
        output_path(Path::new("/data/line12.txt")),
        Path::new("/data/line12_rsr.txt").to_path_buf()
    );
    assert_eq!(
        output_path(Path::new("/data/line12.dat")),
        Path::new("/data/line12.dat_rsr.txt").to_path_buf()
    );
}

#[test]
fn pipeline_is_deterministic_and_persists_a_complete_table() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let infile = dir.path().join("line12.txt");
    let track = constant_track(2000, 1.0, 0.5);
    std::fs::write(&infile, track_file_contents(&track)).expect("cannot write track");

    let cfg = RsrConfig {
        workers: 4,
        ..RsrConfig::default()
    };
    let first = process_track_file(&infile, &cfg).expect("processing failed");
    assert_eq!(first, dir.path().join("line12_rsr.txt"));
    let first_bytes = std::fs::read(&first).expect("cannot read table");

    let second = process_track_file(&infile, &cfg).expect("processing failed");
    let second_bytes = std::fs::read(&second).expect("cannot read table");
    assert_eq!(first_bytes, second_bytes, "re-runs must be byte-identical");

    let table = String::from_utf8(first_bytes).expect("table is not utf-8");
    let mut lines = table.lines();
    assert_eq!(
        lines.next(),
        Some("xo,xa,xb,lon,lat,roll,Psc,Psn,Pbc,Pbn,Rsc,Rsn,Rbc,Rbn,crls,crlb,e1,sh,h0,h1,Q1")
    );
    // winsize 1000, stride 250 over 2000 bins
    assert_eq!(lines.count(), 5);
    assert!(!dir.path().join("line12_rsr.txt.part").exists());
}

#[test]
fn failed_batch_leaves_no_output_file() {
    let dir = tempfile::tempdir().expect("no temp dir");
    let infile = dir.path().join("line13.txt");
    let track = constant_track(2000, 1.0, 0.0);
    std::fs::write(&infile, track_file_contents(&track)).expect("cannot write track");

    let cfg = RsrConfig {
        workers: 4,
        ..RsrConfig::default()
    };
    assert!(process_track_file(&infile, &cfg).is_err());
    assert!(!dir.path().join("line13_rsr.txt").exists());
}
