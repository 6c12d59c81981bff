//! Built-in configuration layered beneath the user's file.

const DEFAULTS: &str = r#"
[general]
locale = US/Eastern
pause_seconds = 12
request_timeout_seconds = 30
metrics = trailing/1-year,trailing/3-year/a,trailing/5-year/a,rolling/1-year
metals = XAU,XAG,XPT,XPD

[endpoints]
alpha_vantage = https://www.alphavantage.co/query
metals = https://metals-api.com/api/timeseries
finnhub = https://finnhub.io/api/v1
dataroma = https://www.dataroma.com/m/holdings.php

[names]
xau = Gold
xag = Silver
xpt = Platinum
xpd = Palladium
"#;

pub fn defaults() -> &'static str {
    DEFAULTS
}
