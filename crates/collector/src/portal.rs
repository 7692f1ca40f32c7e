//! Fixed element locators of the portal's device pages.

pub const LOGIN_USER: &str = "#ctl00_content_tbxUserName";
pub const LOGIN_PASSWORD: &str = "#ctl00_content_tbxPassword";
pub const LOGIN_SUBMIT: &str = "#ctl00_content_btnLogin";

pub const MENU_DEVICE: &str = "#ctl00_RMTopMenu > ul > li.rmItem.rmFirst > a > span";
pub const MENU_SPECIALIST: &str = "#ctl00_SubMenuControl1_subMenu > ul > li:nth-child(4) > a > span";

/// The access code dialog lives in the first embedded frame.
pub const ACCESS_CODE_FRAME: usize = 0;
pub const ACCESS_CODE_INPUT: &str = "#ctl00_DialogContent_tbxSecurityCode";
pub const ACCESS_CODE_SUBMIT: &str = "#ctl00_DialogContent_BtnSave";

pub const REFRESH_BUTTON: &str = "#ctl00_DeviceContextControl1_RefreshDeviceDataButton";
pub const LAST_UPDATE: &str = "#ctl00_DeviceContextControl1_lblDeviceLastDataUpdateInfo";

pub const DATA_NAMES: &str = ".simpleDataName";
pub const DATA_VALUES: &str = ".simpleDataValue";

/// Length of the id suffixes that distinguish a label element from its value element.
pub const NAME_ID_SUFFIX_LEN: usize = 8;
pub const VALUE_ID_SUFFIX_LEN: usize = 9;
