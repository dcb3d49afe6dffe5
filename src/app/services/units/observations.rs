//! Observation name to unit group table
//!
//! Names follow the archive schema used by weewx-style station software.

use super::unit::UnitGroup;

/// Unit group of a standard observation, `None` for unknown names
pub fn observation_group(obs: &str) -> Option<UnitGroup> {
    let group = match obs {
        "outTemp" | "inTemp" | "dewpoint" | "heatindex" | "windchill" | "appTemp" | "humidex"
        | "extraTemp1" | "extraTemp2" | "extraTemp3" | "soilTemp1" | "soilTemp2"
        | "soilTemp3" | "soilTemp4" | "leafTemp1" | "leafTemp2" | "inDewpoint" => {
            UnitGroup::Temperature
        }
        "barometer" | "pressure" | "altimeter" => UnitGroup::Pressure,
        "windSpeed" | "windGust" => UnitGroup::Speed,
        "windSpeed10" | "rms" | "vecavg" => UnitGroup::Speed2,
        "rain" | "dayRain" | "hourRain" | "rain24" | "monthRain" | "yearRain" | "stormRain"
        | "totalRain" | "ET" | "hail" => UnitGroup::Rain,
        "rainRate" | "hailRate" => UnitGroup::RainRate,
        "altitude" | "cloudbase" => UnitGroup::Altitude,
        "visibility" => UnitGroup::Distance,
        "outHumidity" | "inHumidity" | "extraHumid1" | "extraHumid2" | "cloudcover" => {
            UnitGroup::Percent
        }
        "windDir" | "windGustDir" | "vecdir" => UnitGroup::Direction,
        "radiation" | "maxSolarRad" => UnitGroup::Radiation,
        "UV" => UnitGroup::Uv,
        "dateTime" => UnitGroup::Time,
        "consBatteryVoltage" | "heatingVoltage" | "supplyVoltage" | "referenceVoltage" => {
            UnitGroup::Volt
        }
        "interval" => UnitGroup::Interval,
        _ => return None,
    };
    Some(group)
}
