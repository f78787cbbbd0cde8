///! Position -> crew -> classification -> image, once per run

use chrono::{Local, NaiveDate};
use std::sync::Arc;

use crate::config::TrackerConfig;
use crate::error::TrackerResult;
use crate::model::{
    IssDataSource, NominatimClient, OceanClassifier, OpenNotifyClient, RenderedScene,
    ReverseGeocoder, Scene,
};
use crate::module::map::{MapSource, OverpassClient};
use crate::module::renderer::SceneRenderer;

pub struct Pipeline {
    source: Arc<dyn IssDataSource>,
    classifier: OceanClassifier,
    renderer: SceneRenderer,
}

impl Pipeline {
    pub fn new(
        config: &TrackerConfig,
        source: Arc<dyn IssDataSource>,
        geocoder: Arc<dyn ReverseGeocoder>,
        map_source: Arc<dyn MapSource>,
    ) -> Self {
        Self {
            source,
            classifier: OceanClassifier::new(geocoder),
            renderer: SceneRenderer::new(
                config.render.clone(),
                config.style.clone(),
                &config.output_path,
                map_source,
            ),
        }
    }

    /// Pipeline wired to the public open-notify, Nominatim and Overpass services
    pub fn from_config(config: &TrackerConfig) -> TrackerResult<Self> {
        let api = &config.api;
        let source = Arc::new(OpenNotifyClient::new(api)?);
        let geocoder = Arc::new(NominatimClient::new(
            &api.geocode_url,
            &api.user_agent,
            api.geocode_timeout_secs,
        )?);
        let map_source = Arc::new(OverpassClient::new(
            &api.overpass_url,
            &api.user_agent,
            api.overpass_timeout_secs,
        )?);
        Ok(Self::new(config, source, geocoder, map_source))
    }

    pub async fn run(&self) -> TrackerResult<RenderedScene> {
        self.run_on(Local::now().date_naive()).await
    }

    /// Run with a fixed date for the date annotation
    pub async fn run_on(&self, captured_on: NaiveDate) -> TrackerResult<RenderedScene> {
        let coordinate = self.source.fetch_position().await?;
        let roster = self.source.fetch_crew().await?;
        let located = self.classifier.locate(coordinate).await?;

        let scene = Scene {
            coordinate,
            classification: located.classification,
            address: located.address,
            roster,
            captured_on,
        };

        self.renderer.render(&scene).await
    }
}
