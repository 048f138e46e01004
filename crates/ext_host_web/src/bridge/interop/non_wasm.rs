use super::*;

fn unsupported() -> String {
    "Extension APIs are only available when compiled for wasm32".to_string()
}

pub fn local_storage_get(_key: &str) -> Result<Option<String>, StorageError> {
    Ok(None)
}

pub fn local_storage_set(_key: &str, _raw_json: &str) -> Result<(), StorageError> {
    Ok(())
}

pub fn local_storage_remove(_key: &str) -> Result<(), StorageError> {
    Ok(())
}

pub async fn storage_local_get(_keys: &[&str]) -> Result<Map<String, Value>, StorageError> {
    Ok(Map::new())
}

pub async fn storage_local_set(_entries: &Map<String, Value>) -> Result<(), StorageError> {
    Ok(())
}

pub async fn storage_local_remove(_keys: &[&str]) -> Result<(), StorageError> {
    Ok(())
}

pub async fn runtime_send_message(_message: Message) -> Result<Value, MessageError> {
    Err(MessageError::Disconnected(unsupported()))
}

pub fn add_message_listener(_listener: MessageListener) -> Result<ListenerId, MessageError> {
    Err(MessageError::Disconnected(unsupported()))
}

pub fn remove_message_listener(_id: ListenerId) -> bool {
    false
}

pub fn add_exception_listener(_handler: Rc<dyn Fn(String)>) -> Result<(), String> {
    Ok(())
}

pub fn i18n_message(_key: &str) -> Option<String> {
    None
}

pub fn format_time(_hour: u32, _minute: u32, _hour12: bool) -> Result<String, String> {
    Err(unsupported())
}
