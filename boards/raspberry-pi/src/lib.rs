#[macro_use]
extern crate log;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_web::{get, post, web, App, HttpResponse, HttpServer, Responder};
use pi_flight::sync::ControlSlot;
use pi_flight::telemetry::TelemetrySlot;
use pi_flight::types::control::RawControl;
use serde_json::{json, Value};

pub struct State {
    pub control: Arc<ControlSlot>,
    pub telemetry: Arc<TelemetrySlot>,
    pub stale_timeout: Duration,
}

fn bad_request(error: String) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "error": error }))
}

/// Full controller snapshot, fields not present count as released
#[post("/update")]
async fn update(state: web::Data<State>, body: web::Bytes) -> impl Responder {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => return bad_request(e.to_string()),
    };
    if !value.is_object() {
        return bad_request("expected a JSON object".to_owned());
    }
    let control: RawControl = match serde_json::from_value(value) {
        Ok(control) => control,
        Err(e) => return bad_request(e.to_string()),
    };
    trace!("Received controller input {:?}", control);
    state.control.write(control, Instant::now());
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/status")]
async fn status(state: web::Data<State>) -> impl Responder {
    let connected = state.control.is_fresh(Instant::now(), state.stale_timeout);
    HttpResponse::Ok().json(json!({ "connected": connected }))
}

#[get("/telemetry")]
async fn telemetry(state: web::Data<State>) -> impl Responder {
    HttpResponse::Ok().json(state.telemetry.read())
}

pub fn configure(config: &mut web::ServiceConfig) {
    config.service(update).service(status).service(telemetry);
}

pub async fn serve(listen: SocketAddr, state: State) -> std::io::Result<()> {
    let state = web::Data::new(state);
    info!("Start listening on {}", listen);
    let server = move || App::new().app_data(state.clone()).configure(configure);
    HttpServer::new(server).workers(1).bind(listen)?.run().await
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use actix_web::{http::header::ContentType, test, web, App};
    use pi_flight::fcs::{FlightMode, Telemetry};
    use pi_flight::sync::ControlSlot;
    use pi_flight::telemetry::TelemetrySlot;
    use serde_json::{json, Value};

    use super::{configure, State};

    fn state() -> web::Data<State> {
        web::Data::new(State {
            control: Arc::new(ControlSlot::default()),
            telemetry: Arc::new(TelemetrySlot::default()),
            stale_timeout: Duration::from_millis(500),
        })
    }

    #[actix_web::test]
    async fn test_update() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let request = test::TestRequest::get().uri("/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({"connected": false}));

        let payload = json!({"left_y": 0.5, "start_pressed": true, "rt_value": "full"});
        let request = test::TestRequest::post()
            .uri("/update")
            .insert_header(ContentType::json())
            .set_payload(payload.to_string())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({"status": "ok"}));

        let control = state.control.read_within(Instant::now(), Duration::from_secs(1)).unwrap();
        assert_eq!(control.left_y, 0.5);
        assert!(control.start_pressed);
        assert_eq!(control.rt_value, 0.0);

        let request = test::TestRequest::get().uri("/status").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body, json!({"connected": true}));
    }

    #[actix_web::test]
    async fn test_update_malformed() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        for payload in ["{left_y: 1", "[1, 2]", "3"] {
            let request = test::TestRequest::post()
                .uri("/update")
                .insert_header(ContentType::json())
                .set_payload(payload)
                .to_request();
            let response = test::call_service(&app, request).await;
            assert_eq!(response.status(), 400);
            let body: Value = test::read_body_json(response).await;
            assert!(body["error"].is_string());
        }
        assert!(state.control.read_within(Instant::now(), Duration::from_secs(1)).is_err());
    }

    #[actix_web::test]
    async fn test_telemetry() {
        let state = state();
        let telemetry = Telemetry { mode: FlightMode::Armed, throttle: 30.0, ..Default::default() };
        state.telemetry.write(telemetry, Instant::now());
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;
        let request = test::TestRequest::get().uri("/telemetry").to_request();
        let body: Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["mode"], json!("armed"));
        assert_eq!(body["throttle"], json!(30.0));
    }
}
