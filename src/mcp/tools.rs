//! Tool catalog and argument parsing.

// self
use crate::{_prelude::*, fitness::DataSource};

/// Days queried when the caller omits `days`.
pub const DEFAULT_DAYS: NonZeroU32 = NonZeroU32::MIN.saturating_add(6);

/// Tools served by this server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
	/// `get_steps_data`
	Steps,
	/// `get_heart_rate_data`
	HeartRate,
}
impl Tool {
	/// Every tool, in listing order.
	pub const ALL: [Self; 2] = [Self::Steps, Self::HeartRate];

	/// Wire name.
	pub const fn name(self) -> &'static str {
		match self {
			Self::Steps => "get_steps_data",
			Self::HeartRate => "get_heart_rate_data",
		}
	}

	/// Data stream the tool aggregates.
	pub const fn source(self) -> DataSource {
		match self {
			Self::Steps => DataSource::STEPS,
			Self::HeartRate => DataSource::HEART_RATE,
		}
	}

	fn description(self) -> &'static str {
		match self {
			Self::Steps => "Google Fitness API에서 걸음 수 데이터를 가져옵니다. (daily step counts)",
			Self::HeartRate => "Google Fitness API에서 심박수 데이터를 가져옵니다. (hourly heart rate)",
		}
	}

	/// `tools/list` entry.
	pub fn definition(self) -> Value {
		serde_json::json!({
			"name": self.name(),
			"description": self.description(),
			"inputSchema": {
				"type": "object",
				"properties": {
					"days": {
						"type": "integer",
						"minimum": 1,
						"default": DEFAULT_DAYS.get(),
						"description": "가져올 데이터의 일수 (number of days to fetch)"
					}
				}
			}
		})
	}
}
impl FromStr for Tool {
	type Err = ToolArgumentError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|tool| tool.name() == s)
			.ok_or_else(|| ToolArgumentError::UnknownTool { name: s.into() })
	}
}

/// Rejected `tools/call` parameters.
#[derive(Debug, ThisError)]
pub enum ToolArgumentError {
	/// `params` is missing or not a `{name, arguments}` object.
	#[error("Invalid tools/call params: {0}")]
	Params(#[source] serde_path_to_error::Error<serde_json::Error>),
	/// No tool with that name.
	#[error("Unknown tool: {name}")]
	UnknownTool {
		/// Requested tool name.
		name: String,
	},
	/// `arguments` failed validation.
	#[error("Invalid arguments: {0}")]
	Arguments(#[source] serde_path_to_error::Error<serde_json::Error>),
}

#[derive(Deserialize)]
struct CallParams {
	name: String,
	#[serde(default)]
	arguments: Option<Value>,
}

#[derive(Deserialize)]
struct DaysArguments {
	#[serde(default = "default_days")]
	days: NonZeroU32,
}

/// Validated `tools/call` request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ToolCall {
	/// Tool to run.
	pub tool: Tool,
	/// Positive day count.
	pub days: NonZeroU32,
}
impl ToolCall {
	/// Parses `tools/call` params.
	pub fn parse(params: Option<Value>) -> Result<Self, ToolArgumentError> {
		let params: CallParams = from_value(params.unwrap_or(Value::Null))
			.map_err(ToolArgumentError::Params)?;
		let tool = params.name.parse()?;
		let arguments = match params.arguments {
			None | Some(Value::Null) => Value::Object(Default::default()),
			Some(arguments) => arguments,
		};
		let DaysArguments { days } = from_value(arguments).map_err(ToolArgumentError::Arguments)?;

		Ok(Self { tool, days })
	}
}

fn from_value<T>(value: Value) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	serde_path_to_error::deserialize(value)
}

fn default_days() -> NonZeroU32 {
	DEFAULT_DAYS
}
