use anyhow::Context;
use log::{error, info, trace};
use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Deserializer, Serialize,
};
use serde_json::Value;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, PoisonError, RwLock,
    },
    thread::{self, JoinHandle},
};

/// Open-Meteo forecast for Sydney: current conditions plus today's range
pub const DEFAULT_FORECAST_URL: &str = concat!(
    "https://api.open-meteo.com/v1/forecast",
    "?latitude=-33.8688&longitude=151.2093",
    "&daily=weather_code,temperature_2m_max,temperature_2m_min",
    "&current=temperature_2m,weather_code",
    "&timezone=Australia%2FSydney&forecast_days=1",
);

/// Something that can produce a forecast. The real one goes over HTTP; tests
/// swap in their own.
pub trait ForecastSource: Send + 'static {
    fn fetch(&self) -> anyhow::Result<ForecastResponse>;
}

impl<S: ForecastSource + ?Sized> ForecastSource for Box<S> {
    fn fetch(&self) -> anyhow::Result<ForecastResponse> {
        (**self).fetch()
    }
}

/// Fetches the forecast with a single HTTP GET
#[derive(Debug)]
pub struct HttpForecastSource {
    url: String,
}

impl HttpForecastSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl ForecastSource for HttpForecastSource {
    fn fetch(&self) -> anyhow::Result<ForecastResponse> {
        // ureq treats non-2xx as an error for us
        let response = ureq::get(&self.url).call().with_context(|| {
            format!("Error fetching forecast from {}", self.url)
        })?;
        response
            .into_json()
            .context("Error parsing forecast as JSON")
    }
}

/// What the weather card shows. Starts out loading, then gets filled in
/// exactly once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub loading: bool,
    pub error: bool,
    pub current: Option<CurrentConditions>,
    pub today: Option<TodayForecast>,
}

impl WeatherSnapshot {
    pub fn loading() -> Self {
        Self {
            loading: true,
            error: false,
            current: None,
            today: None,
        }
    }

    pub fn failed() -> Self {
        Self {
            loading: false,
            error: true,
            current: None,
            today: None,
        }
    }

    fn loaded(response: ForecastResponse) -> Self {
        let ForecastResponse { current, daily } = response;
        let current = current.unwrap_or_default();
        let daily = daily.unwrap_or_default();
        Self {
            loading: false,
            error: false,
            current: Some(CurrentConditions {
                temp: current.temperature_2m,
                code: current.weather_code,
            }),
            today: Some(TodayForecast {
                max: daily.temperature_2m_max,
                min: daily.temperature_2m_min,
                code: daily.weather_code,
            }),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temp: Option<f64>,
    pub code: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TodayForecast {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub code: Option<f64>,
}

/// Weather widget. The fetch happens in a background thread and the result
/// is deposited in the shared snapshot. Dropping the widget cancels the
/// fetch.
#[derive(Debug)]
pub struct Weather {
    snapshot: Arc<RwLock<WeatherSnapshot>>,
    canceled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Weather {
    /// Start the one and only fetch for this widget
    pub fn mount(source: impl ForecastSource) -> Self {
        let snapshot = Arc::new(RwLock::new(WeatherSnapshot::loading()));
        let canceled = Arc::new(AtomicBool::new(false));

        let lock = Arc::clone(&snapshot);
        let canceled_flag = Arc::clone(&canceled);
        let handle = thread::spawn(move || {
            info!("Fetching forecast");
            let result = source.fetch();

            // Check for cancellation while holding the lock. Cancelling also
            // takes the lock, so once `cancel` returns nothing gets written
            let mut guard = match lock.write() {
                Ok(guard) => guard,
                Err(err) => {
                    error!("Error saving forecast: {err}");
                    return;
                }
            };
            if canceled_flag.load(Ordering::SeqCst) {
                trace!("Forecast fetch canceled, dropping result");
                return;
            }
            *guard = match result {
                Ok(response) => {
                    info!("Saving forecast");
                    WeatherSnapshot::loaded(response)
                }
                Err(err) => {
                    error!("Error fetching forecast: {err:?}");
                    WeatherSnapshot::failed()
                }
            };
        });

        Self {
            snapshot,
            canceled,
            handle: Some(handle),
        }
    }

    /// Get a copy of the current snapshot
    pub fn snapshot(&self) -> WeatherSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Cancel the fetch. If it's still in flight, its result is thrown away.
    /// Safe to call more than once.
    pub fn cancel(&self) {
        let _guard = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Block until the fetch thread is done
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Forecast thread panicked");
            }
        }
    }

    /// Grab the shared snapshot and the fetch thread, so a test can watch
    /// what happens after the widget is gone
    #[cfg(test)]
    pub(crate) fn detach(
        &mut self,
    ) -> (Arc<RwLock<WeatherSnapshot>>, Option<JoinHandle<()>>) {
        (Arc::clone(&self.snapshot), self.handle.take())
    }
}

impl Drop for Weather {
    fn drop(&mut self) {
        // Don't wait for the thread; it finishes on its own and writes nothing
        self.cancel();
    }
}

/// Forecast body. Only the fields we show are listed, and every one of them
/// is optional. Values of the wrong type are treated as missing.
/// https://open-meteo.com/en/docs
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default, deserialize_with = "object")]
    current: Option<CurrentBlock>,
    #[serde(default, deserialize_with = "object")]
    daily: Option<DailyBlock>,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct CurrentBlock {
    #[serde(default, deserialize_with = "number")]
    temperature_2m: Option<f64>,
    #[serde(default, deserialize_with = "number")]
    weather_code: Option<f64>,
}

/// Daily values come as arrays, one entry per day. We only ask for one day
#[derive(Clone, Debug, Default, Deserialize)]
struct DailyBlock {
    #[serde(default, deserialize_with = "first_number")]
    temperature_2m_max: Option<f64>,
    #[serde(default, deserialize_with = "first_number")]
    temperature_2m_min: Option<f64>,
    #[serde(default, deserialize_with = "first_number")]
    weather_code: Option<f64>,
}

/// A nested block. Anything that isn't an object is the same as missing
fn object<'de, D: Deserializer<'de>, T: DeserializeOwned>(
    d: D,
) -> Result<Option<T>, D::Error> {
    match Value::deserialize(d)? {
        value @ Value::Object(_) => {
            T::deserialize(value).map(Some).map_err(de::Error::custom)
        }
        _ => Ok(None),
    }
}

fn number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(d)?.as_f64())
}

fn first_number<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<f64>, D::Error> {
    Ok(Value::deserialize(d)?
        .as_array()
        .and_then(|values| values.first())
        .and_then(Value::as_f64))
}

/// Display info for a WMO weather condition code
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Condition {
    pub icon: &'static str,
    pub label: &'static str,
}

impl Condition {
    /// Used for any code we don't know
    pub const FALLBACK: Self = Self {
        icon: "🌤️",
        label: "Forecast",
    };

    const TABLE: &'static [(u8, Self)] = &[
        (0, Self::new("☀️", "Clear")),
        (1, Self::new("🌤️", "Mostly clear")),
        (2, Self::new("⛅", "Partly cloudy")),
        (3, Self::new("☁️", "Cloudy")),
        (45, Self::new("🌫️", "Fog")),
        (48, Self::new("🌫️", "Rime fog")),
        (51, Self::new("🌦️", "Light drizzle")),
        (53, Self::new("🌦️", "Drizzle")),
        (55, Self::new("🌧️", "Heavy drizzle")),
        (56, Self::new("🌧️", "Freezing drizzle")),
        (57, Self::new("🌧️", "Heavy freezing drizzle")),
        (61, Self::new("🌦️", "Light rain")),
        (63, Self::new("🌧️", "Rain")),
        (65, Self::new("🌧️", "Heavy rain")),
        (66, Self::new("🌨️", "Freezing rain")),
        (67, Self::new("🌨️", "Heavy freezing rain")),
        (71, Self::new("🌨️", "Light snow")),
        (73, Self::new("❄️", "Snow")),
        (75, Self::new("❄️", "Heavy snow")),
        (77, Self::new("🌨️", "Snow grains")),
        (80, Self::new("🌦️", "Rain showers")),
        (81, Self::new("🌧️", "Heavy showers")),
        (82, Self::new("⛈️", "Violent showers")),
        (85, Self::new("🌨️", "Snow showers")),
        (86, Self::new("🌨️", "Heavy snow showers")),
        (95, Self::new("⛈️", "Thunderstorm")),
        (96, Self::new("⛈️", "Storm + hail")),
        (99, Self::new("⛈️", "Severe storm + hail")),
    ];

    const fn new(icon: &'static str, label: &'static str) -> Self {
        Self { icon, label }
    }

    /// Look up a condition code. Missing codes, codes that aren't whole
    /// numbers, and codes not in the table all get [Self::FALLBACK]
    pub fn from_code(code: Option<f64>) -> Self {
        code.filter(|code| code.fract() == 0.0)
            .and_then(|code| {
                Self::TABLE
                    .iter()
                    .find(|(table_code, _)| f64::from(*table_code) == code)
            })
            .map(|(_, condition)| *condition)
            .unwrap_or(Self::FALLBACK)
    }
}

/// Round to a whole degree, with halves going up (so -2.5 becomes -2)
pub fn round_degrees(value: Option<f64>) -> i64 {
    (value.unwrap_or_default() + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        sync::mpsc,
    };

    /// Source that hands back a canned result
    struct StaticSource(fn() -> anyhow::Result<ForecastResponse>);

    impl ForecastSource for StaticSource {
        fn fetch(&self) -> anyhow::Result<ForecastResponse> {
            (self.0)()
        }
    }

    /// Source that blocks until the test releases it
    struct GatedSource(mpsc::Receiver<()>);

    impl ForecastSource for GatedSource {
        fn fetch(&self) -> anyhow::Result<ForecastResponse> {
            self.0.recv()?;
            Ok(serde_json::from_str(SAMPLE)?)
        }
    }

    // Trimmed-down version of a real response
    const SAMPLE: &str = r#"{
        "latitude": -33.875,
        "longitude": 151.25,
        "current_units": {"temperature_2m": "°C", "weather_code": "wmo code"},
        "current": {
            "time": "2024-11-02T14:15",
            "interval": 900,
            "temperature_2m": 22.6,
            "weather_code": 3
        },
        "daily": {
            "time": ["2024-11-02"],
            "weather_code": [61],
            "temperature_2m_max": [24.4],
            "temperature_2m_min": [16.5]
        }
    }"#;

    #[test]
    fn test_condition_table() {
        for (code, condition) in Condition::TABLE {
            assert_eq!(
                Condition::from_code(Some(f64::from(*code))),
                *condition
            );
        }
        assert_eq!(
            Condition::from_code(Some(63.0)),
            Condition::new("🌧️", "Rain")
        );
    }

    #[test]
    fn test_condition_fallback() {
        assert_eq!(Condition::from_code(Some(9999.0)), Condition::FALLBACK);
        assert_eq!(Condition::from_code(Some(4.0)), Condition::FALLBACK);
        assert_eq!(Condition::from_code(Some(-1.0)), Condition::FALLBACK);
        assert_eq!(Condition::from_code(Some(2.5)), Condition::FALLBACK);
        assert_eq!(Condition::from_code(None), Condition::FALLBACK);
    }

    #[test]
    fn test_non_numeric_code() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"current": {"temperature_2m": 20, "weather_code": "3"}}"#,
        )
        .unwrap();
        let snapshot = WeatherSnapshot::loaded(response);
        let current = snapshot.current.unwrap();
        assert_eq!(current.temp, Some(20.0));
        assert_eq!(current.code, None);
        assert_eq!(Condition::from_code(current.code), Condition::FALLBACK);
    }

    #[test]
    fn test_parse_full() {
        let response: ForecastResponse = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(
            WeatherSnapshot::loaded(response),
            WeatherSnapshot {
                loading: false,
                error: false,
                current: Some(CurrentConditions {
                    temp: Some(22.6),
                    code: Some(3.0),
                }),
                today: Some(TodayForecast {
                    max: Some(24.4),
                    min: Some(16.5),
                    code: Some(61.0),
                }),
            }
        );
    }

    #[test]
    fn test_parse_missing_fields() {
        let response: ForecastResponse =
            serde_json::from_str(r#"{"daily": {"weather_code": []}}"#).unwrap();
        assert_eq!(
            WeatherSnapshot::loaded(response),
            WeatherSnapshot {
                loading: false,
                error: false,
                current: Some(CurrentConditions {
                    temp: None,
                    code: None,
                }),
                today: Some(TodayForecast {
                    max: None,
                    min: None,
                    code: None,
                }),
            }
        );
    }

    #[test]
    fn test_parse_wrong_block_types() {
        let response: ForecastResponse = serde_json::from_str(
            r#"{"current": 5, "daily": {"weather_code": [3]}}"#,
        )
        .unwrap();
        let snapshot = WeatherSnapshot::loaded(response);
        assert_eq!(
            snapshot.current,
            Some(CurrentConditions {
                temp: None,
                code: None,
            })
        );
        assert_eq!(snapshot.today.unwrap().code, Some(3.0));

        let response: ForecastResponse = serde_json::from_str(
            r#"{"current": {"temperature_2m": 18.2}, "daily": "x"}"#,
        )
        .unwrap();
        let snapshot = WeatherSnapshot::loaded(response);
        assert!(!snapshot.error);
        assert_eq!(snapshot.current.unwrap().temp, Some(18.2));
        assert_eq!(
            snapshot.today,
            Some(TodayForecast {
                max: None,
                min: None,
                code: None,
            })
        );
    }

    #[test]
    fn test_round_degrees() {
        assert_eq!(round_degrees(Some(22.6)), 23);
        assert_eq!(round_degrees(Some(22.5)), 23);
        assert_eq!(round_degrees(Some(22.4)), 22);
        assert_eq!(round_degrees(Some(-2.5)), -2);
        assert_eq!(round_degrees(Some(-2.6)), -3);
        assert_eq!(round_degrees(None), 0);
    }

    #[test]
    fn test_fetch_success() {
        let mut weather =
            Weather::mount(StaticSource(|| Ok(serde_json::from_str(SAMPLE)?)));
        weather.join();
        let snapshot = weather.snapshot();
        assert!(!snapshot.loading);
        assert!(!snapshot.error);
        assert_eq!(snapshot.current.unwrap().temp, Some(22.6));
    }

    #[test]
    fn test_fetch_failure() {
        let mut weather =
            Weather::mount(StaticSource(|| Err(anyhow!("connection refused"))));
        weather.join();
        assert_eq!(weather.snapshot(), WeatherSnapshot::failed());
    }

    #[test]
    fn test_cancel_before_resolution() {
        let (release, gate) = mpsc::channel();
        let mut weather = Weather::mount(GatedSource(gate));
        assert_eq!(weather.snapshot(), WeatherSnapshot::loading());

        weather.cancel();
        release.send(()).unwrap();
        weather.join();
        // The fetch finished, but nothing was written
        assert_eq!(weather.snapshot(), WeatherSnapshot::loading());
    }

    #[test]
    fn test_http_failure() {
        // Nothing listens on port 9 locally, so this fails fast
        let mut weather = Weather::mount(HttpForecastSource::new(
            "http://127.0.0.1:9/forecast",
        ));
        weather.join();
        assert_eq!(weather.snapshot(), WeatherSnapshot::failed());
    }

    /// Serve a single canned HTTP response on a local port. Return the URL
    fn serve_once(status: &str, body: &str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/forecast", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\n\
            Content-Type: application/json\r\n\
            Content-Length: {}\r\n\
            Connection: close\r\n\r\n{body}",
            body.len()
        );
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            // Read the request headers before answering
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            stream.write_all(response.as_bytes()).unwrap();
        });
        url
    }

    #[test]
    fn test_http_error_status() {
        let url = serve_once("503 Service Unavailable", "{}");
        let mut weather = Weather::mount(HttpForecastSource::new(url));
        weather.join();
        assert_eq!(weather.snapshot(), WeatherSnapshot::failed());
    }

    #[test]
    fn test_http_bad_body() {
        let url = serve_once("200 OK", "not json");
        let mut weather = Weather::mount(HttpForecastSource::new(url));
        weather.join();
        assert_eq!(weather.snapshot(), WeatherSnapshot::failed());
    }

    #[test]
    fn test_http_success() {
        let url = serve_once("200 OK", SAMPLE);
        let mut weather = Weather::mount(HttpForecastSource::new(url));
        weather.join();
        let snapshot = weather.snapshot();
        assert!(!snapshot.error);
        assert_eq!(snapshot.today.unwrap().max, Some(24.4));
    }
}
