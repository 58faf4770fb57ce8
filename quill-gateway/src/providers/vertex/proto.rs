// Generated protobuf code from tonic/prost for the trimmed Vertex AI
// PredictionService subset under proto/.

pub mod google {
    pub mod cloud {
        pub mod aiplatform {
            pub mod v1 {
                tonic::include_proto!("google.cloud.aiplatform.v1");
            }
        }
    }
}
