use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client as DynamoDbClient;

use crate::error::DatabaseError;
use freshtrack_ingest::shared::domain::RegisteredSensor;

/// Look up a sensor in the registry by its normalized DevEUI
///
/// # Returns
/// * `Ok(Some(RegisteredSensor))` - Sensor registered to a unit
/// * `Ok(None)` - DevEUI not in the registry
/// * `Err(DatabaseError)` - DynamoDB error or malformed item
pub async fn get_sensor_by_dev_eui(
    client: &DynamoDbClient,
    table_name: &str,
    dev_eui: &str,
) -> Result<Option<RegisteredSensor>, DatabaseError> {
    let result = client
        .get_item()
        .table_name(table_name)
        .key("dev_eui", AttributeValue::S(dev_eui.to_string()))
        .send()
        .await?;

    match result.item {
        Some(item) => {
            let sensor: RegisteredSensor = serde_dynamo::from_item(item)?;
            Ok(Some(sensor))
        }
        None => Ok(None),
    }
}
