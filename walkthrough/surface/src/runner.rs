//! 程序运行函数.

use crate::result::SurfaceReport;
use cell_berry::analysis::{equalize_histogram, max_projection};
use cell_berry::consts::DEFAULT_BINS;
use cell_berry::pipeline::{self, SurfaceSpec};
use cell_berry::view::{self, SliceViewer};
use cell_berry::{Axis3, IntensityVolume, LabelVolume, VolumeAttr};
use log::{info, warn};
use std::fs;
use std::path::Path;
use utils::loader;

/// 保存网格与中间层切片预览.
fn export(volume: &LabelVolume, report: &SurfaceReport, out: &Path) {
    if let Err(e) = fs::create_dir_all(out) {
        warn!("cannot create {}: {e}", out.display());
        return;
    }
    for cell in report.cells() {
        let path = out.join(format!("cell_{:04}.obj", cell.label()));
        if let Err(e) = cell.mesh().save_obj(&path) {
            warn!("cannot save {}: {e}", path.display());
        }
    }
    if let Some(mut viewer) = SliceViewer::labels(volume) {
        viewer.set_index(volume.len_z() / 2);
        let path = out.join("labels_mid_plane.png");
        if let Err(e) = viewer.save(&path) {
            warn!("cannot save {}: {e}", path.display());
        }
    }
}

/// 保存强度体数据均衡化后沿 z 方向的最大强度投影.
fn export_projection(intensity: &IntensityVolume, out: &Path) {
    let eq = equalize_histogram(intensity, DEFAULT_BINS);
    let mip = max_projection(&eq, Axis3::Plane);
    let path = out.join("intensity_mip.png");
    match view::save_projection(&mip, Some(utils::equalized_window()), &path) {
        Ok(()) => info!("saved {}", path.display()),
        Err(e) => warn!("cannot save {}: {e}", path.display()),
    }
}

/// 实际运行.
pub fn run() -> SurfaceReport {
    let volume = loader::labels_from_env_or_home().expect("Loading labelled volume error");
    info!(
        "volume {:?}, spacing {:?}, {} worker(s)",
        volume.shape(),
        volume.spacing().as_array(),
        utils::cpus()
    );

    let spec = SurfaceSpec::default();
    println!("Measuring cell surfaces...");
    let report = match loader::label_from_env() {
        Some(label) => SurfaceReport::from_iter([pipeline::measure_region(&volume, label, &spec)]),
        None => SurfaceReport::from_iter(pipeline::measure_all(&volume, &spec)),
    };

    let out = loader::output_dir_from_env_or_home();
    export(&volume, &report, &out);
    match loader::intensity_from_env() {
        Some(Ok(intensity)) => export_projection(&intensity, &out),
        Some(Err(e)) => warn!("cannot load intensity volume: {e}"),
        None => {}
    }

    #[cfg(feature = "plot")]
    {
        if let Some(mut viewer) = SliceViewer::labels(&volume) {
            view::browse(&mut viewer).expect("OpenCV window error");
        }
    }

    report
}
