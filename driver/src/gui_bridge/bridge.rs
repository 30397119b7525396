use crate::generator::scene::SceneConfig;
use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::Runner;
use anyhow::Context;
use log::{error, info};
use serde_json::json;
use std::{
    net::SocketAddr,
    sync::{Arc, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter};

#[derive(Debug)]
struct WarpError;

impl warp::reject::Reject for WarpError {}

/// Holds the latest visualisation snapshot and serves it over HTTP.
pub struct GuiBridge {
    state: Arc<RwLock<VisualizationModel>>,
    runner: Arc<Runner>,
}

impl GuiBridge {
    pub fn new(runner: Arc<Runner>) -> Self {
        Self {
            state: Arc::new(RwLock::new(VisualizationModel::default())),
            runner,
        }
    }

    /// Starts the HTTP endpoint on a background thread.
    ///
    /// `GET /summary` returns the current snapshot; `POST /ingest-scene`
    /// runs the workflow on a posted synthetic scene and replaces it.
    pub fn serve(&self, addr: SocketAddr) -> anyhow::Result<thread::JoinHandle<()>> {
        let state_for_filter = self.state.clone();
        let state_filter = warp::any().map(move || state_for_filter.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());

        let summary_route = warp::path("summary")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<VisualizationModel>>| {
                let snapshot = state
                    .read()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone();
                warp::reply::json(&snapshot)
            });

        let scene_route = warp::path("ingest-scene")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and_then(
                |scene: SceneConfig,
                 state: Arc<RwLock<VisualizationModel>>,
                 runner: Arc<Runner>| async move {
                    match runner.execute_scene(&scene) {
                        Ok(result) => {
                            let model = result.visualization();
                            let report = result.report();
                            *state.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = model;
                            if let Some(description) = scene.description.as_ref() {
                                info!(
                                    "[GUI] scene {} -> {} polygons",
                                    description, report.polygon_count
                                );
                            }
                            Ok::<_, warp::Rejection>(warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "ok",
                                    "polygons": report.polygon_count,
                                    "area_km2": report.area_km2,
                                })),
                                StatusCode::OK,
                            ))
                        }
                        Err(err) => {
                            error!("ingest-scene error: {:#}", err);
                            Err(warp::reject::custom(WarpError))
                        }
                    }
                },
            );

        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("building bridge runtime")?;
        let handle = thread::Builder::new()
            .name("gui-bridge".into())
            .spawn(move || {
                let routes = summary_route.or(scene_route);
                runtime.block_on(async move {
                    warp::serve(routes).run(addr).await;
                });
            })
            .context("spawning bridge thread")?;
        info!("[GUI] serving on http://{}", addr);
        Ok(handle)
    }

    pub fn publish(&self, model: &VisualizationModel) {
        let mut guard = self
            .state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = model.clone();
        info!(
            "[GUI] histograms: {}, polygons: {}",
            guard.histograms.len(),
            guard.report.as_ref().map_or(0, |r| r.polygon_count)
        );
    }

    pub fn publish_status(&self, message: &str) {
        info!("[GUI] {}", message);
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> VisualizationModel {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}
