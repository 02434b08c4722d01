//! HTML pages for the web surface and the `plan` command
//!
//! Pages are handlebars templates compiled into the binary. Every city gets a
//! panel with a Leaflet map, a dish gallery and download links; images are
//! looked up while the panel is built and simply left out when missing.

use anyhow::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::export;
use crate::images::ImageSearch;
use crate::models::{CityFailure, DietaryPreference, TourBatch, TourPlan, TourRequest};

const FORM_PAGE: &str = "index";
const RESULTS_PAGE: &str = "results";

/// Checkbox state for one dietary preference
#[derive(Debug, Serialize)]
struct PreferenceOption {
    label: &'static str,
    checked: bool,
}

#[derive(Debug, Serialize)]
struct FormView {
    cities: String,
    prefs: Vec<PreferenceOption>,
    surprise: bool,
    festival: bool,
    version: &'static str,
}

impl FormView {
    fn from_request(request: &TourRequest) -> Self {
        let prefs = DietaryPreference::ALL
            .iter()
            .map(|pref| PreferenceOption {
                label: pref.label(),
                checked: request.prefs.contains(pref),
            })
            .collect();
        Self {
            cities: request.cities.clone(),
            prefs,
            surprise: request.surprise,
            festival: request.festival,
            version: crate::VERSION,
        }
    }
}

#[derive(Debug, Serialize)]
struct DishCard {
    name: String,
    image: Option<String>,
}

#[derive(Debug, Serialize)]
struct RestaurantLine {
    dish: String,
    names: String,
}

/// A stop as the map script sees it
#[derive(Debug, Serialize)]
struct MapMarker<'a> {
    name: &'a str,
    lat: f64,
    lon: f64,
    image: Option<String>,
}

/// Everything the results template needs for one city
#[derive(Debug, Serialize)]
pub struct CityPanel {
    city: String,
    heading: String,
    dining: String,
    map_id: String,
    /// JSON array of markers, safe to embed in a `<script>` element
    markers: Option<String>,
    route_km: String,
    dishes: Vec<DishCard>,
    restaurants: Vec<RestaurantLine>,
    bonus_stop: Option<String>,
    trivia: String,
    itinerary: String,
    json_href: String,
    json_name: String,
    pdf_href: Option<String>,
    pdf_name: String,
}

#[derive(Debug, Serialize)]
struct ResultsView {
    #[serde(flatten)]
    form: FormView,
    panels: Vec<CityPanel>,
    failures: Vec<CityFailure>,
    generated_at: String,
}

/// Renders the form and result pages
pub struct Renderer {
    hbs: Handlebars<'static>,
    images: Arc<dyn ImageSearch>,
}

impl Renderer {
    pub fn new(images: Arc<dyn ImageSearch>) -> Result<Self> {
        let mut hbs = Handlebars::new();
        hbs.register_partial("head", include_str!("../templates/head.hbs"))
            .context("Invalid head partial")?;
        hbs.register_partial("form", include_str!("../templates/form.hbs"))
            .context("Invalid form partial")?;
        hbs.register_template_string(FORM_PAGE, include_str!("../templates/index.hbs"))
            .context("Invalid index template")?;
        hbs.register_template_string(RESULTS_PAGE, include_str!("../templates/results.hbs"))
            .context("Invalid results template")?;
        Ok(Self { hbs, images })
    }

    pub fn form_page(&self, request: &TourRequest) -> Result<String> {
        self.hbs
            .render(FORM_PAGE, &FormView::from_request(request))
            .context("Failed to render form page")
    }

    pub async fn results_page(&self, request: &TourRequest, batch: &TourBatch) -> Result<String> {
        let mut panels = Vec::with_capacity(batch.tours.len());
        for (index, plan) in batch.tours.iter().enumerate() {
            panels.push(self.panel(index, plan).await?);
        }

        let view = ResultsView {
            form: FormView::from_request(request),
            panels,
            failures: batch.failures.clone(),
            generated_at: batch.generated_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        };
        self.hbs
            .render(RESULTS_PAGE, &view)
            .context("Failed to render results page")
    }

    /// Results page for a single city, as written by the `plan` command
    pub async fn city_page(&self, request: &TourRequest, plan: &TourPlan) -> Result<String> {
        let mut batch = TourBatch::new();
        batch.tours.push(plan.clone());
        self.results_page(request, &batch).await
    }

    pub async fn panel(&self, index: usize, plan: &TourPlan) -> Result<CityPanel> {
        debug!("Building panel for {}", plan.city);

        let mut dishes = Vec::with_capacity(plan.dishes.len());
        for dish in &plan.dishes {
            dishes.push(DishCard {
                name: dish.clone(),
                image: self.images.thumbnail(dish).await,
            });
        }

        let markers = if plan.stops.is_empty() {
            None
        } else {
            let mut markers = Vec::with_capacity(plan.stops.len());
            for stop in &plan.stops {
                markers.push(MapMarker {
                    name: &stop.name,
                    lat: stop.lat,
                    lon: stop.lon,
                    image: self.images.thumbnail(&stop.name).await,
                });
            }
            Some(script_json(&markers)?)
        };

        let restaurants = plan
            .restaurants
            .iter()
            .map(|(dish, names)| RestaurantLine {
                dish: dish.to_string(),
                names: names.join(", "),
            })
            .collect();

        Ok(CityPanel {
            city: plan.city.clone(),
            heading: format!("{} — {}", plan.city, plan.weather().summary()),
            dining: plan.dining.to_string(),
            map_id: format!("map-{index}"),
            markers,
            route_km: format!("{:.1}", plan.route_length_km()),
            dishes,
            restaurants,
            bonus_stop: plan.bonus_stop.clone(),
            trivia: plan.trivia.clone(),
            itinerary: plan.itinerary.clone(),
            json_href: export::json_data_uri(plan)?,
            json_name: export::json_file_name(&plan.city),
            pdf_href: export::pdf_data_uri(plan),
            pdf_name: export::pdf_file_name(&plan.city),
        })
    }
}

/// Serializes for inline `<script>` use; `<`, `>` and `&` can't close the element
fn script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string(value).context("Failed to serialize map markers")?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}
