//! Compiles the trimmed Vertex AI proto subset into the gRPC client used
//! by the vertex provider. `protoc` is vendored so builds do not depend on
//! a system installation.

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point prost at the vendored protoc binary
    unsafe {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    tonic_prost_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(
            &["../proto/google/cloud/aiplatform/v1/prediction_service.proto"],
            &["../proto"],
        )?;

    println!(
        "cargo:rerun-if-changed=../proto/google/cloud/aiplatform/v1/prediction_service.proto"
    );

    Ok(())
}
