// Static dictionary of known SMART attribute ids.

/// Metadata for one known attribute id.
#[derive(Debug, Clone, Copy)]
pub struct AttributeDef {
    pub id: u8,
    pub name: &'static str,
    /// Growth on this attribute usually precedes drive failure.
    pub critical: bool,
}

/// Ids whose raw value failing to stay at zero flags a dying disk.
pub const RAW_FAIL_IDS: [u8; 7] = [0x05, 0x0A, 0xB8, 0xBB, 0xC4, 0xC5, 0xC6];

/// Ids carrying a Celsius reading in the raw value's low byte.
pub const TEMPERATURE_IDS: [u8; 3] = [0xBE, 0xC2, 0xE7];

const fn def(id: u8, name: &'static str, critical: bool) -> AttributeDef {
    AttributeDef { id, name, critical }
}

#[rustfmt::skip]
static ATTRIBUTE_DEFINITIONS: &[AttributeDef] = &[
    def(0x01, "Read_Error_Rate", false),
    def(0x02, "Throughput_Performance", false),
    def(0x03, "Spin_Up_Time", false),
    def(0x04, "Start_Stop_Count", false),
    def(0x05, "Reallocated_Sector_Ct", true),
    def(0x07, "Seek_Error_Rate", false),
    def(0x08, "Seek_Time_Performance", false),
    def(0x09, "Power_On_Hours", false),
    def(0x0A, "Spin_Retry_Count", true),
    def(0x0B, "Recalibration_Retries", false),
    def(0x0C, "Power_Cycle_Count", false),
    def(0x0D, "Soft_Read_Error_Rate", false),
    def(0xAA, "Available_Reserved_Space", false),
    def(0xAB, "SSD_Program_Fail_Count", true),
    def(0xAC, "SSD_Erase_Fail_Count", true),
    def(0xAD, "SSD_Wear_Leveling_Count", false),
    def(0xAE, "Unexpected_Power_Loss", false),
    def(0xB7, "SATA_Downshift_Count", false),
    def(0xB8, "End_to_End_Error", true),
    def(0xBB, "Reported_Uncorrect", true),
    def(0xBC, "Command_Timeout", false),
    def(0xBD, "High_Fly_Writes", true),
    def(0xBE, "Airflow_Temperature", false),
    def(0xBF, "G-Sense_Error_Rate", false),
    def(0xC0, "Power-Off_Retract_Count", false),
    def(0xC1, "Load_Cycle_Count", false),
    def(0xC2, "Temperature_Celsius", false),
    def(0xC3, "Hardware_ECC_Recovered", false),
    def(0xC4, "Reallocation_Event_Count", true),
    def(0xC5, "Current_Pending_Sector", true),
    def(0xC6, "Offline_Uncorrectable", true),
    def(0xC7, "UltraDMA_CRC_Error_Count", false),
    def(0xC8, "Write_Error_Rate", false),
    def(0xC9, "Soft_Read_Error_Rate", false),
    def(0xCA, "Data_Address_Mark_Error", false),
    def(0xCB, "Run_Out_Cancel", false),
    def(0xCC, "Soft_ECC_Correction", false),
    def(0xCD, "Thermal_Asperity_Rate", false),
    def(0xCE, "Flying_Height", false),
    def(0xCF, "Spin_High_Current", false),
    def(0xD0, "Spin_Buzz", false),
    def(0xD1, "Offline_Seek_Performance", false),
    def(0xDC, "Disk_Shift", false),
    def(0xDD, "G-Sense_Error_Rate_2", false),
    def(0xDE, "Loaded_Hours", false),
    def(0xDF, "Load_Retry_Count", false),
    def(0xE0, "Load_Friction", false),
    def(0xE1, "Load_Cycle_Count_2", false),
    def(0xE2, "Load_In_Time", false),
    def(0xE3, "Torque_Amplification", false),
    def(0xE4, "Power-Off_Retract_Cycle", false),
    def(0xE6, "GMR_Head_Amplitude", false),
    def(0xE7, "Temperature_Celsius_2", false),
    def(0xE8, "Endurance_Remaining", false),
    def(0xE9, "Power_On_Hours_2", false),
    def(0xEA, "Average_Erase_Count", false),
    def(0xEB, "Good_Block_Count", false),
    def(0xF0, "Head_Flying_Hours", false),
    def(0xF1, "Total_LBAs_Written", false),
    def(0xF2, "Total_LBAs_Read", false),
    def(0xFA, "Read_Error_Retry_Rate", false),
    def(0xFE, "Free_Fall_Protection", false),
];

/// Look up the dictionary entry for an id, if it is a known one.
pub fn lookup(id: u8) -> Option<&'static AttributeDef> {
    ATTRIBUTE_DEFINITIONS.iter().find(|d| d.id == id)
}
