use std::hint::black_box;
use bencher::{TestCase, TestFile};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use micro_transport::codec::ResponseDecoder;
use micro_transport::protocol::{Message, PayloadItem};
use tokio_util::bytes::BytesMut;
use tokio_util::codec::Decoder;

static SMALL_JSON: TestFile = TestFile::new("json_small.txt", include_str!("../resources/response/json_small.txt"));
static LARGE_CHUNKED: TestFile = TestFile::new("chunked_large.txt", include_str!("../resources/response/chunked_large.txt"));

fn create_test_cases() -> Vec<TestCase> {
    vec![TestCase::small("small_json_response", SMALL_JSON), TestCase::large("large_chunked_response", LARGE_CHUNKED)]
}

fn benchmark_response_decoder(criterion: &mut Criterion) {
    let test_cases = create_test_cases();
    let mut group = criterion.benchmark_group("response_decoder");

    for case in test_cases {
        group.throughput(Throughput::Bytes(case.file().len()));
        group.bench_with_input(BenchmarkId::from_parameter(case.name()), &case, |b, case| {
            let mut response_decoder = ResponseDecoder::default();
            b.iter_batched_ref(
                || BytesMut::from(case.file().content()),
                |bytes_mut| {
                    let header = response_decoder.decode(bytes_mut).expect("input should be valid http response header").unwrap();
                    let mut body_len = 0;
                    loop {
                        match response_decoder.decode(bytes_mut).expect("input should be valid http response body") {
                            Some(Message::Payload(PayloadItem::Chunk(bytes))) => body_len += bytes.len(),
                            Some(Message::Payload(PayloadItem::Eof)) => break,
                            other => panic!("unexpected decoder output: {other:?}"),
                        }
                    }
                    black_box((header, body_len));
                },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(decoder, benchmark_response_decoder);
criterion_main!(decoder);
