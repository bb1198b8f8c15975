pub mod event_lookup_tool;
pub mod flight_lookup_tool;
pub mod hotel_lookup_tool;
pub mod registry;
mod tool;
pub mod weather_lookup_tool;

pub use event_lookup_tool::EventLookupTool;
pub use flight_lookup_tool::FlightLookupTool;
pub use hotel_lookup_tool::HotelLookupTool;
pub use registry::{ToolRegistry, ToolRegistryBuilder, UnknownToolPolicy, TRAVEL_TOOL_NAMES};
pub use tool::{
    optional_int, optional_str, required_str, FunctionDescriptor, LlmTool, ToolDescriptor,
    ToolOutcome,
};
pub use weather_lookup_tool::WeatherLookupTool;
