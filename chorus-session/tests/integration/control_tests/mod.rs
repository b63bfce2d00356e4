pub mod test_deafen_and_output_switch;
pub mod test_input_device_switch;
pub mod test_mute_propagation;
